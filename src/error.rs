use thiserror::Error;

/// Errors a [`crate::searcher::Searcher`] can surface. Matches the error
/// kinds and policy in the core's error handling design: every variant is
/// fatal to the call that produced it, and the merger never hands back
/// partial results alongside one of these.
#[derive(Debug, Clone, Error)]
pub enum SearchError {
    #[error("Mask bounds exceed section size")]
    InvalidMask { width: u32, height: u32 },

    #[error("negative threshold is reserved for a future 'find sparsest' mode")]
    InvalidRegion,

    #[error("GPU device does not support required capability: {0}")]
    DeviceUnsupported(String),

    #[error("GPU compute shader failed to build: {0}")]
    ShaderBuildFailure(String),

    #[error("GPU search produced more than {capacity} results in one tile (got {actual})")]
    BufferOverflow { capacity: u32, actual: u32 },

    #[error("internal assertion failed: {0}")]
    InternalAssertion(String),

    #[error("a search is already in progress on this Searcher")]
    SearchInProgress,

    #[error("Searcher has been destroyed")]
    Destroyed,
}

pub type Result<T> = std::result::Result<T, SearchError>;
