/*!
 * Error types for Emergence Guard
 */

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GuardError>;

/// Exit code constants for structured process exit
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_TRIGGERED: i32 = 1;
pub const EXIT_FATAL: i32 = 2;

#[derive(Debug, Error)]
pub enum GuardError {
    /// Configuration error (fatal at construction)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Privileged provider could not be resolved (triggers fallback)
    #[error("Provider resolution failed: {0}")]
    ProviderResolution(String),

    /// A single provider sample call failed (triggers cycle skip)
    #[error("Provider sample fault: {0}")]
    ProviderSample(String),

    /// Emergency record could not be persisted
    #[error("Persistence fault: {0}")]
    Persistence(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GuardError {
    /// Check if this error is fatal (must reject startup)
    pub fn is_fatal(&self) -> bool {
        match self {
            // Invalid configuration must never be silently clamped
            GuardError::Config(_) => true,

            // Everything below the loop is caught and recorded, never
            // propagated as process-terminating
            GuardError::ProviderResolution(_) => false,
            GuardError::ProviderSample(_) => false,
            GuardError::Persistence(_) => false,
            GuardError::Io(_) => false,
            GuardError::Serialization(_) => false,
        }
    }

    /// Get error category for logging and instrumentation
    pub fn category(&self) -> &'static str {
        match self {
            GuardError::Config(_) => "configuration",
            GuardError::ProviderResolution(_) => "resolution",
            GuardError::ProviderSample(_) => "provider",
            GuardError::Persistence(_) => "persistence",
            GuardError::Io(_) => "io",
            GuardError::Serialization(_) => "serialization",
        }
    }
}
