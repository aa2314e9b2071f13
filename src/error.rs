//! Crate-level error type.
//!
//! Each subsystem owns a focused error enum; `RuntimeControlError` wraps them so
//! callers working across subsystems (the control façade, the operator binary)
//! can use a single `Result` alias.

use crate::config::ConfigurationError;
use crate::pipeline::PipelineError;
use crate::registry::RegistryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeControlError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RuntimeControlError {
    /// Caller errors are rejections of a bad request, as opposed to degraded
    /// conditions or broken internal invariants.
    pub fn is_caller_error(&self) -> bool {
        match self {
            Self::Registry(_) => true,
            Self::Pipeline(err) => err.is_caller_error(),
            Self::Configuration(_) | Self::Serialization(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, RuntimeControlError>;
