//! Application layer for switchboard
//!
//! This crate contains the pipeline use cases, port definitions, the
//! classifier, and the resilience components (circuit breaker, concurrency
//! governor, classification cache). It depends only on the domain layer.

pub mod cache;
pub mod classifier;
pub mod config;
pub mod ports;
pub mod resilience;
pub mod use_cases;

// Re-export commonly used types
pub use cache::IntentCache;
pub use classifier::Classifier;
pub use config::PipelineParams;
pub use ports::{
    conversation_store::ConversationStorePort,
    model_gateway::{GatewayError, ModelGatewayPort, ModelReply},
    tool_executor::ToolExecutorPort,
};
pub use resilience::{
    AdmissionError, AdmissionPermit, BreakerConfig, BreakerError, CircuitBreaker, CircuitState,
    ConcurrencyGovernor, GuardedCall,
};
pub use use_cases::{
    Draft,
    local_dispatch::LocalDispatcher,
    orchestrate::ToolOrchestrator,
    process_request::{PipelineResult, ProcessRequestUseCase},
};
