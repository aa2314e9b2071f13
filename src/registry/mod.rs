//! # Service Selection Registry
//!
//! Chooses among redundant backend providers of a logical service type using
//! priority groups, per-group strategies and per-provider circuit breakers.
//!
//! Stage logic asks for a provider, calls it, and reports the outcome back:
//!
//! ```rust
//! use runtime_control::registry::{
//!     Priority, ProviderRegistration, SelectionStrategy, ServiceSelectionRegistry, ServiceType,
//! };
//!
//! let registry = ServiceSelectionRegistry::default();
//! registry
//!     .register(ProviderRegistration::new("openai_primary", ServiceType::Llm).with_priority(Priority::High))
//!     .unwrap();
//! registry
//!     .register(ProviderRegistration::new("local_llm", ServiceType::Llm).in_group(1))
//!     .unwrap();
//!
//! if let Some(provider) = registry.select(ServiceType::Llm).into_provider() {
//!     // ... call the provider ...
//!     registry.report_outcome(provider.name(), true).unwrap();
//! }
//! ```

pub mod error;
pub mod explanation;
pub mod health;
pub mod provider;
pub mod service_registry;
pub mod types;

pub use error::RegistryError;
pub use explanation::SelectionExplanation;
pub use health::{OverallHealth, ServiceHealthStatus};
pub use provider::{ProviderInfo, ProviderRecord};
pub use service_registry::{
    CircuitBreakerReset, PriorityChange, PriorityUpdate, PriorityUpdateRequest,
    SelectionOutcome, ServiceSelectionRegistry,
};
pub use types::{Priority, ProviderRegistration, ProviderSettings, SelectionStrategy, ServiceType};
