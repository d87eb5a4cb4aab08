//! Target storage seam: the host owns persistence, the broker only asks for a
//! new sidereal target.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

/// Host vocabulary for a fixed point on the sky.
pub const SIDEREAL: &str = "SIDEREAL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTarget {
    pub name: String,
    #[serde(rename = "type")]
    pub target_type: String,
    pub ra: f64,
    pub dec: f64,
}

/// Handle of a target created by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetHandle {
    pub id: u64,
    pub name: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TargetError {
    #[error("target {0:?} already exists")]
    DuplicateName(String),

    #[error("target store failed: {0}")]
    Backend(String),
}

#[async_trait]
pub trait TargetStore: Send + Sync {
    async fn create(&self, target: NewTarget) -> Result<TargetHandle, TargetError>;
}

/// Process-local store, used by the demo server and tests.
#[derive(Debug, Default)]
pub struct InMemoryTargetStore {
    inner: Mutex<HashMap<String, (u64, NewTarget)>>,
}

impl InMemoryTargetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<NewTarget> {
        let g = self.inner.lock().expect("target store mutex poisoned");
        g.get(name).map(|(_, t)| t.clone())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("target store mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TargetStore for InMemoryTargetStore {
    async fn create(&self, target: NewTarget) -> Result<TargetHandle, TargetError> {
        let mut g = self.inner.lock().expect("target store mutex poisoned");
        if g.contains_key(&target.name) {
            return Err(TargetError::DuplicateName(target.name));
        }
        let id = g.len() as u64 + 1;
        let name = target.name.clone();
        g.insert(name.clone(), (id, target));
        Ok(TargetHandle { id, name })
    }
}
