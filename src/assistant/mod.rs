//! AI assistant collaborator seam
//!
//! Question + live fleet context -> free text + usage metadata. The
//! production backend is an OpenAI-compatible HTTP endpoint; a rule-based
//! answerer covers the unconfigured and failure paths.

mod agent;
pub mod context;
pub mod rules;

pub use agent::{AnswerBackend, AssistantError, BackendReply, FleetAssistant, OpenAiCompatBackend};
