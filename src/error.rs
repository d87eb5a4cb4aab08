//! Error types for the Fink adapter.

use thiserror::Error;

use crate::target::TargetError;

#[derive(Error, Debug)]
pub enum FinkError {
    #[error("no query selected: fill exactly one search field")]
    NoQuerySelected,

    #[error("only one query type can be selected, got: {}", .0.join(", "))]
    MultipleQuerySelected(Vec<&'static str>),

    #[error("cone search expects `ra, dec, radius`, got {0:?}")]
    MalformedConeSearch(String),

    #[error("date search expects `startdate, window`, got {0:?}")]
    MalformedDateSearch(String),

    #[error("class search expects `class, n`, got {0:?}")]
    MalformedClassSearch(String),

    #[error("number of days in the past must be numeric, got {0:?}")]
    InvalidDayCount(String),

    #[error("Fink API returned status {status}: {body}")]
    RemoteService { status: u16, body: String },

    #[error("malformed alert record: {0}")]
    MalformedRecord(String),

    #[error("unexpected payload from Fink API: {0}")]
    UnexpectedPayload(String),

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Target(#[from] TargetError),
}

impl FinkError {
    /// True for mistakes in the submitted form values (nothing was sent).
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            FinkError::NoQuerySelected
                | FinkError::MultipleQuerySelected(_)
                | FinkError::MalformedConeSearch(_)
                | FinkError::MalformedDateSearch(_)
                | FinkError::MalformedClassSearch(_)
                | FinkError::InvalidDayCount(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, FinkError>;
