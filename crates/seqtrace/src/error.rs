use thiserror::Error;

/// Trace collection errors.
///
/// All of these are caller mistakes; none of them leave the emitter's
/// listener set in a modified state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TraceError {
    #[error("collector is already active")]
    AlreadyActive,
    #[error("collector session has ended; construct a new collector")]
    SessionEnded,
    #[error("invalid collector config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, TraceError>;
