// Defaults for Planwell, overridable from the environment (or .env via dotenvy).

use std::env;

/// Maximum number of exchanges retained per session.
pub const MEMORY_CAPACITY: usize = 20;
/// Number of most-recent exchanges fed back into each prompt.
pub const CONTEXT_WINDOW: usize = 5;
/// Maximum resources appended to a plan.
pub const MAX_SEARCH_RESULTS: usize = 3;
/// Entries listed by the history view, newest first.
pub const HISTORY_VIEW_LIMIT: usize = 10;
/// Character budget for plan summaries in the history view.
pub const SUMMARY_CHAR_BUDGET: usize = 300;
/// Character budget for goal labels in the history view.
pub const GOAL_LABEL_CHAR_BUDGET: usize = 60;

pub const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";

/// Goals mentioning any of these (case-insensitive substring) get web research.
pub const RESEARCH_KEYWORDS: [&str; 4] = ["learn", "research", "study", "find"];

/// Sentinel returned by `ConversationMemory::recent_context` on an empty log.
pub const NO_HISTORY: &str = "No previous conversation.";

pub const NO_PROGRESS: &str = "We haven't started working on any goals yet!";

pub const SEARCH_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

pub const PERSONA: &str = "\
You are Professor Planwell, an experienced teacher and planning expert.
Your personality:
- Patient and encouraging
- Clear and structured in explanations
- Uses analogies and examples
- Remembers student's progress
- Adapts to learning style
- Celebrates small victories

Teaching style:
1. Break down complex goals into manageable steps
2. Provide reasoning for each step
3. Suggest resources and timelines
4. Check for understanding
5. Offer encouragement";

pub const INTRODUCTION: &str = "\
👋 Hello! I'm Professor Planwell, your personal planning assistant!

I'm here to help you:
• Break down big goals into manageable steps
• Create structured plans with clear reasoning
• Remember your progress and preferences
• Provide teacher-style guidance and encouragement

What goal would you like to work on today? 🎯";

lazy_static::lazy_static! {
    pub static ref GEMINI_URL: String = env::var("GEMINI_URL").unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string());
    pub static ref GEMINI_MODEL: String = env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.0-flash".to_string());
    pub static ref OLLAMA_URL: String = env::var("OLLAMA_URL").unwrap_or_else(|_| "http://127.0.0.1:11434".to_string());
    pub static ref OLLAMA_MODEL: String = env::var("OLLAMA_MODEL").unwrap_or_else(|_| "gemma3:12b".to_string());
    pub static ref SEARCH_URL: String = env::var("PLANWELL_SEARCH_URL").unwrap_or_else(|_| "https://www.google.com/search".to_string());
    pub static ref TEMPLATES_DIR: String = env::var("PLANWELL_TEMPLATES_DIR").unwrap_or_else(|_| "templates".to_string());
    pub static ref STATIC_DIR: String = env::var("PLANWELL_STATIC_DIR").unwrap_or_else(|_| "static".to_string());
}
