#![allow(clippy::doc_markdown)] // Allow technical terms like ASPDMA, DMA in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Runtime Control
//!
//! Control plane for an agent engine's cognitive pipeline.
//!
//! ## Overview
//!
//! Two concerns share one concurrency discipline and one administrative surface:
//!
//! - **Pipeline step control**: thoughts move through five ordered stages
//!   (`gather_context → perform_dmas → perform_aspdma → conscience_execution →
//!   action_complete`). The pipeline free-runs, or is paused and advanced one
//!   tick at a time for inspection.
//! - **Service selection**: redundant providers of each service type are
//!   chosen by priority group and per-group strategy, with a circuit breaker
//!   per provider on the hot path of every outbound call.
//!
//! ## Module Organization
//!
//! - [`pipeline`] - Step points, stage results, pipeline state and the step controller
//! - [`registry`] - Provider registration, selection, priority updates and explanation
//! - [`resilience`] - Lock-free circuit breakers
//! - [`control`] - Operator façade with boundary validation
//! - [`config`] - YAML configuration with environment overrides
//! - [`logging`] - Structured logging setup and event helpers
//! - [`error`] - Crate-level error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use runtime_control::config::ConfigManager;
//! use runtime_control::control::bootstrap;
//! use runtime_control::pipeline::{
//!     StageError, StageProcessor, StepMetadata, StepPoint, StepResult, ThoughtInPipeline,
//! };
//! use std::sync::Arc;
//!
//! struct Loop;
//!
//! #[async_trait::async_trait]
//! impl StageProcessor for Loop {
//!     async fn process_step(
//!         &self,
//!         step: StepPoint,
//!         thought: &ThoughtInPipeline,
//!     ) -> Result<StepResult, StageError> {
//!         Ok(StepResult::empty(step, StepMetadata::new(&thought.thought_id)))
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let plane = bootstrap(manager.config(), Arc::new(Loop))?;
//!
//! plane.service.pause("inspect the next stage");
//! let response = plane.service.single_step(true).await;
//! println!("round {:?}: {}", response.round_number, response.message);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod control;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod registry;
pub mod resilience;

pub use config::{ConfigManager, ConfigurationError, RuntimeControlConfig};
pub use control::{bootstrap, ControlPlane, PipelineControl, RuntimeControlService};
pub use error::{Result, RuntimeControlError};
pub use pipeline::{
    PipelineError, PipelineState, PipelineStepController, StageError, StageProcessor, StepPoint,
    StepResult, ThoughtInPipeline,
};
pub use registry::{
    Priority, ProviderRegistration, RegistryError, SelectionOutcome, SelectionStrategy,
    ServiceSelectionRegistry, ServiceType,
};
pub use resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
