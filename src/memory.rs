//! Bounded per-session conversation log.

use std::collections::VecDeque;

use serde::Serialize;
use tracing::debug;

use crate::constants::{
    GOAL_LABEL_CHAR_BUDGET, MEMORY_CAPACITY, NO_HISTORY, NO_PROGRESS, SUMMARY_CHAR_BUDGET,
};

/// One goal and the plan produced for it. Never modified after insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationEntry {
    pub input: String,
    pub output: String,
    pub sequence_number: u64,
    /// Set when `output` is the rendered text of a failed completion.
    pub failed: bool,
}

/// A history row as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryItem {
    pub number: u64,
    pub goal_label: String,
    pub goal: String,
    pub summary: String,
    pub failed: bool,
}

#[derive(Debug)]
pub struct ConversationMemory {
    entries: VecDeque<ConversationEntry>,
    capacity: usize,
    next_sequence: u64,
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self::with_capacity(MEMORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity: capacity.max(1),
            next_sequence: 0,
        }
    }

    pub fn record(&mut self, input: impl Into<String>, output: impl Into<String>) -> &ConversationEntry {
        self.push(input.into(), output.into(), false)
    }

    pub fn record_failed(&mut self, input: impl Into<String>, output: impl Into<String>) -> &ConversationEntry {
        self.push(input.into(), output.into(), true)
    }

    fn push(&mut self, input: String, output: String, failed: bool) -> &ConversationEntry {
        let sequence_number = self.next_sequence;
        self.next_sequence += 1;
        self.entries.push_back(ConversationEntry {
            input,
            output,
            sequence_number,
            failed,
        });
        while self.entries.len() > self.capacity {
            if let Some(evicted) = self.entries.pop_front() {
                debug!(sequence_number = evicted.sequence_number, "Evicted oldest conversation entry");
            }
        }
        // Just pushed, so the deque is non-empty.
        &self.entries[self.entries.len() - 1]
    }

    /// Transcript of the last `n` exchanges, or [`NO_HISTORY`] when nothing was recorded.
    pub fn recent_context(&self, n: usize) -> String {
        if self.entries.is_empty() {
            return NO_HISTORY.to_string();
        }
        let skip = self.entries.len().saturating_sub(n);
        let mut context = String::from("Recent conversation:\n");
        for entry in self.entries.iter().skip(skip) {
            context.push_str(&format!("Student: {}\n", entry.input));
            context.push_str(&format!("Teacher: {}\n", entry.output));
        }
        context
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &ConversationEntry> + ExactSizeIterator {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&ConversationEntry> {
        self.entries.back()
    }

    /// Up to `limit` entries, newest first, with summaries cut to the display budget.
    pub fn history_view(&self, limit: usize) -> Vec<HistoryItem> {
        self.entries
            .iter()
            .rev()
            .take(limit)
            .map(|entry| HistoryItem {
                number: entry.sequence_number + 1,
                goal_label: truncate_chars(&entry.input, GOAL_LABEL_CHAR_BUDGET),
                goal: entry.input.clone(),
                summary: truncate_chars(&entry.output, SUMMARY_CHAR_BUDGET),
                failed: entry.failed,
            })
            .collect()
    }

    pub fn progress_report(&self) -> String {
        let Some(latest) = self.latest() else {
            return NO_PROGRESS.to_string();
        };
        format!(
            "📊 **Progress Report**\n\n\
             Total goals we've worked on: {}\n\
             Most recent goal: {}\n\n\
             I remember all our conversations and can see how you're growing!\n\
             Keep up the great work! 🌟",
            self.entries.len(),
            latest.input
        )
    }
}

/// Cuts `text` to at most `budget` characters, adding "..." when something was dropped.
pub fn truncate_chars(text: &str, budget: usize) -> String {
    match text.char_indices().nth(budget) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}
