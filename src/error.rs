use serde::Serialize;
use thiserror::Error;

use crate::db::StoreError;
use crate::geocoding::GeocodingError;
use crate::validation::ValidationError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("network error: {0}")]
    Network(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("not allowed: {0}")]
    Unauthorized(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<GeocodingError> for AppError {
    fn from(err: GeocodingError) -> Self {
        AppError::Network(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => AppError::NotFound(what),
            StoreError::NotOwner { .. } => AppError::Unauthorized(OWNER_ONLY.to_string()),
            StoreError::Invalid(inner) => AppError::Validation(inner),
            other => AppError::Storage(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Warning,
    Error,
}

/// Toast shown by the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

pub const OWNER_ONLY: &str = "You can only change events you created";

impl AppError {
    /// What the UI shows. Storage and network details stay in the logs.
    pub fn notice(&self) -> Notice {
        match self {
            AppError::Validation(err) => Notice::warning(err.to_string()),
            AppError::Unauthorized(reason) => Notice::error(reason.clone()),
            AppError::NotFound(what) => {
                let kind = what.split_whitespace().next().unwrap_or("item");
                Notice::warning(format!("That {kind} could not be found"))
            }
            AppError::Network(_) => {
                Notice::error("Could not reach the server, please try again")
            }
            AppError::Storage(_) | AppError::Config(_) => {
                Notice::error("Something went wrong, please try again")
            }
        }
    }
}

impl From<AppError> for Notice {
    fn from(err: AppError) -> Self {
        if matches!(err, AppError::Storage(_) | AppError::Config(_) | AppError::Network(_)) {
            tracing::error!("{err}");
        }
        err.notice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_onto_taxonomy() {
        let err: AppError = StoreError::NotFound("event abc".into()).into();
        assert!(matches!(err, AppError::NotFound(_)));

        let err: AppError = StoreError::NotOwner {
            event_id: "abc".into(),
            artist_id: "someone".into(),
        }
        .into();
        assert!(matches!(err, AppError::Unauthorized(_)));
        assert_eq!(err.notice().level, NoticeLevel::Error);

        let err: AppError = StoreError::Invalid(ValidationError::NoCategory).into();
        assert!(matches!(err, AppError::Validation(ValidationError::NoCategory)));
    }

    #[test]
    fn notices_hide_internal_details() {
        let owner: Notice = AppError::from(StoreError::NotOwner {
            event_id: "e9".into(),
            artist_id: "a2".into(),
        })
        .into();
        assert_eq!(owner, Notice::error(OWNER_ONLY));

        let sqlite: Notice = AppError::from(StoreError::Payload("expected value at line 1".into())).into();
        assert_eq!(sqlite, Notice::error("Something went wrong, please try again"));

        let missing: Notice = AppError::from(StoreError::NotFound("artist signed-in-artist".into())).into();
        assert_eq!(missing, Notice::warning("That artist could not be found"));

        let signed_out: Notice = AppError::Unauthorized("Please sign in first".into()).into();
        assert_eq!(signed_out, Notice::error("Please sign in first"));
    }

    #[test]
    fn validation_notice_carries_message() {
        let err = AppError::from(ValidationError::Required("title"));
        assert_eq!(err.notice(), Notice::warning("title is required"));
    }
}
