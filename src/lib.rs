//! Professor Planwell: a goal-planning assistant.
//!
//! A goal goes through [`planner::PlanningCoordinator`]: it is wrapped in a
//! persona prompt together with recent conversation, sent to a hosted model,
//! remembered, and, for learning/research goals, followed by a few links
//! scraped from a web search.

pub mod chat;
pub mod config;
pub mod constants;
pub mod error;
pub mod llm_interaction;
pub mod memory;
pub mod personalization;
pub mod planner;
pub mod prompt;
pub mod research;
pub mod web_server;

pub use config::{PlannerConfig, Provider};
pub use error::{CompletionError, ConfigError, PlanningError, SearchError};
pub use llm_interaction::CompletionClient;
pub use memory::{ConversationEntry, ConversationMemory};
pub use planner::{PlanOutcome, PlanReply, PlanningCoordinator, SessionFactory};
pub use research::{ResourceFinder, SearchResult};
