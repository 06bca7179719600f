//! Core orchestration logic.
//!
//! This module contains:
//! - SessionManager: the single active recording slot
//! - ProcessingPipeline: transcribe → summarize → classify sequencing
//! - KnowledgeStore: the authoritative record set
//! - Hub: the consumer-facing facade wiring it all together

pub mod hub;
pub mod pipeline;
pub mod session;
pub mod store;

// Re-export commonly used types
pub use hub::{Collaborators, Hub, PendingRecord};
pub use pipeline::{PipelineError, ProcessingPipeline};
pub use session::{SessionError, SessionManager};
pub use store::{KnowledgeStore, StoreError};
