use thiserror::Error;

/// Failures of the three network operations. Each is caught where the
/// operation is driven, logged, and never appended to the conversation log.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("backend was not ready after {attempts} attempts")]
    BackendUnavailable { attempts: u32 },
    #[error("chat turn failed: {0}")]
    TurnFailed(String),
    #[error("data refresh failed: {0}")]
    RefreshFailed(String),
}
