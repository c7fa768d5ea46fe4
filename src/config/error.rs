//! Configuration error types

/// Errors raised while validating chart settings.
///
/// All variants are raised synchronously at the call that supplied the bad
/// configuration; no partial state is ever applied.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("width must be positive, was {0}")]
    InvalidWidth(u32),

    #[error("height must be positive, was {0}")]
    InvalidHeight(u32),

    #[error("mapping for metric {metric:?} references unknown line key {line:?}")]
    UnknownLineKey { metric: String, line: String },

    #[error("mapping for metric {metric:?} references unknown facet key {facet:?}")]
    UnknownFacetKey { metric: String, facet: String },

    #[error("draw interval must be a positive integer, was {0}")]
    InvalidDrawInterval(usize),
}

/// Result alias for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
