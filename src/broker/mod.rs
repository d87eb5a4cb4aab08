//! Fink broker adapter: query dispatch, alert normalization, target creation.
//!
//! For the available query services see the Fink API documentation at
//! `{base_url}/api`.

pub mod alert;
pub mod query;

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::FinkConfig;
use crate::error::{FinkError, Result};
use crate::form::QueryParameters;
use crate::target::{NewTarget, TargetHandle, TargetStore, SIDEREAL};

pub use alert::{to_generic_alert, AlertStream, GenericAlert, RawAlert};
pub use query::{FinkRequest, QueryMode, EXPLORER_ENDPOINT};

pub const BROKER_NAME: &str = "Fink";

/// Client for the Fink REST API.
///
/// Stateless between calls; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct FinkBroker {
    http: reqwest::Client,
    config: FinkConfig,
    clock: fn() -> DateTime<Utc>,
}

impl FinkBroker {
    pub fn new(config: FinkConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = config.connect_timeout_secs {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }
        let http = builder.build()?;
        Ok(Self {
            http,
            config,
            clock: Utc::now,
        })
    }

    /// Replace the clock used to anchor date-window searches.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn name(&self) -> &'static str {
        BROKER_NAME
    }

    pub fn config(&self) -> &FinkConfig {
        &self.config
    }

    /// Run the single search selected in the form values.
    ///
    /// Validation errors are returned before anything is sent.
    pub async fn fetch_alerts(&self, params: &QueryParameters) -> Result<AlertStream> {
        let mode = QueryMode::from_parameters(params)?;
        self.fetch_query(&mode).await
    }

    /// Run an already-parsed search.
    pub async fn fetch_query(&self, mode: &QueryMode) -> Result<AlertStream> {
        let req = mode.to_request(&self.config.columns_param(), (self.clock)())?;
        debug!(field = mode.field(), endpoint = req.endpoint, "fink query");

        let payload = self.post(&req).await?;
        let stream = AlertStream::from_payload(payload)?;
        counter!("fink_alerts_received_total").increment(stream.len() as u64);
        info!(
            field = mode.field(),
            alerts = stream.len(),
            "fink query returned"
        );
        Ok(stream)
    }

    /// Run a search and project every record onto [`GenericAlert`].
    pub async fn fetch_generic_alerts(&self, params: &QueryParameters) -> Result<Vec<GenericAlert>> {
        self.fetch_alerts(params)
            .await?
            .map(|raw| raw.and_then(|r| self.to_generic_alert(&r)))
            .collect()
    }

    /// All alerts of one object, payload passed through as received.
    pub async fn fetch_alert(&self, object_id: &str) -> Result<Value> {
        let req = FinkRequest {
            endpoint: EXPLORER_ENDPOINT,
            body: serde_json::json!({
                "objectId": object_id,
                "columns": self.config.columns_param(),
            }),
        };
        debug!(object_id, "fink alert lookup");
        self.post(&req).await
    }

    pub fn to_generic_alert(&self, alert: &RawAlert) -> Result<GenericAlert> {
        to_generic_alert(alert, &self.config.base_url)
    }

    /// Ask the host store for a sidereal target at the alert position.
    pub async fn to_target<S>(&self, alert: &GenericAlert, store: &S) -> Result<TargetHandle>
    where
        S: TargetStore + ?Sized,
    {
        let target = NewTarget {
            name: alert.name.clone(),
            target_type: SIDEREAL.to_string(),
            ra: alert.ra,
            dec: alert.dec,
        };
        let handle = store.create(target).await?;
        info!(name = %handle.name, id = handle.id, "target created from fink alert");
        Ok(handle)
    }

    async fn post(&self, req: &FinkRequest) -> Result<Value> {
        let url = format!("{}{}", self.config.base_url, req.endpoint);
        counter!("fink_requests_total", "endpoint" => req.endpoint).increment(1);
        let t0 = Instant::now();

        let mut attempt: u32 = 0;
        let resp = loop {
            attempt += 1;
            match self.http.post(&url).json(&req.body).send().await {
                Ok(rsp) => break rsp,
                Err(e)
                    if retry_allowed(attempt, self.config.max_retries)
                        && (e.is_connect() || e.is_timeout()) =>
                {
                    let backoff = retry_backoff(attempt);
                    warn!(error = %e, attempt, ?backoff, endpoint = req.endpoint, "fink request failed, retrying");
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => {
                    warn!(error = %e, endpoint = req.endpoint, "fink request failed");
                    counter!("fink_request_errors_total").increment(1);
                    return Err(e.into());
                }
            }
        };

        let status = resp.status();
        histogram!("fink_request_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), endpoint = req.endpoint, "fink api error");
            counter!("fink_request_errors_total").increment(1);
            return Err(FinkError::RemoteService {
                status: status.as_u16(),
                body,
            });
        }

        resp.json::<Value>().await.map_err(|e| {
            if e.is_decode() {
                FinkError::UnexpectedPayload(e.to_string())
            } else {
                FinkError::Transport(e)
            }
        })
    }
}

/// `attempt` counts from 1; the first try plus `max_retries` retries are allowed.
fn retry_allowed(attempt: u32, max_retries: u8) -> bool {
    attempt <= u32::from(max_retries)
}

fn retry_backoff(attempt: u32) -> Duration {
    Duration::from_millis(250u64 << attempt.saturating_sub(1).min(6))
}
