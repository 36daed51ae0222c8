//! Goal processing for one user session.
//!
//! A [`PlanningCoordinator`] owns its [`ConversationMemory`] and student profile
//! outright; sessions never share mutable state. The completion client and the
//! resource finder are stateless and shared behind `Arc`s.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::config::PlannerConfig;
use crate::constants::CONTEXT_WINDOW;
use crate::error::{ConfigError, PlanningError};
use crate::llm_interaction::{self, CompletionClient};
use crate::memory::ConversationMemory;
use crate::personalization::{LearningStyle, PersonalizationTagger, StudentProfile};
use crate::prompt::PromptBuilder;
use crate::research::{self, ResourceFinder, SearchResult, WebSearchScraper};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlanningStage {
    Idle,
    BuildingPrompt,
    AwaitingCompletion,
    Enriching,
    Done,
}

/// What the completion service produced for a goal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanOutcome {
    Planned(String),
    Failed { reason: String },
}

impl PlanOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, PlanOutcome::Failed { .. })
    }

    /// User-facing text. Failures keep their reason verbatim.
    pub fn render(&self) -> String {
        match self {
            PlanOutcome::Planned(text) => text.clone(),
            PlanOutcome::Failed { reason } => {
                format!("I encountered an error while planning: {reason}")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlanReply {
    pub outcome: PlanOutcome,
    /// Final markdown: rendered outcome plus any resources block and tip.
    pub text: String,
    /// `None` when the exchange was not recorded.
    pub sequence_number: Option<u64>,
    pub research_attempted: bool,
    pub resources: Vec<SearchResult>,
    pub learning_style: Option<LearningStyle>,
}

pub struct PlanningCoordinator {
    memory: ConversationMemory,
    prompts: PromptBuilder,
    completion: Arc<dyn CompletionClient>,
    finder: Option<Arc<dyn ResourceFinder>>,
    tagger: Option<PersonalizationTagger>,
    profile: StudentProfile,
    record_failures: bool,
    stage: PlanningStage,
}

impl PlanningCoordinator {
    pub fn new(completion: Arc<dyn CompletionClient>) -> Self {
        Self {
            memory: ConversationMemory::new(),
            prompts: PromptBuilder::default(),
            completion,
            finder: None,
            tagger: None,
            profile: StudentProfile::default(),
            record_failures: true,
            stage: PlanningStage::Idle,
        }
    }

    pub fn with_resource_finder(mut self, finder: Arc<dyn ResourceFinder>) -> Self {
        self.finder = Some(finder);
        self
    }

    pub fn with_tagger(mut self, tagger: PersonalizationTagger) -> Self {
        self.tagger = Some(tagger);
        self
    }

    pub fn with_prompt_builder(mut self, prompts: PromptBuilder) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_memory(mut self, memory: ConversationMemory) -> Self {
        self.memory = memory;
        self
    }

    /// Whether failed completions are written to memory. On by default.
    pub fn record_failures(mut self, record: bool) -> Self {
        self.record_failures = record;
        self
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    pub fn profile(&self) -> &StudentProfile {
        &self.profile
    }

    pub fn stage(&self) -> PlanningStage {
        self.stage
    }

    fn transition(&mut self, next: PlanningStage) {
        debug!(from = ?self.stage, to = ?next, "Planning stage transition");
        self.stage = next;
    }

    /// Runs one goal through prompt, completion, memory, and optional enrichment.
    ///
    /// Only blank goals are rejected; service failures come back as
    /// [`PlanOutcome::Failed`] inside an `Ok` reply.
    #[instrument(skip(self, goal), fields(goal_len = goal.len()))]
    pub async fn process_goal(&mut self, goal: &str) -> Result<PlanReply, PlanningError> {
        if goal.trim().is_empty() {
            warn!("Rejected empty goal");
            return Err(PlanningError::EmptyGoal);
        }

        self.transition(PlanningStage::BuildingPrompt);
        if !self.memory.is_empty() {
            info!(entries = self.memory.len(), "Reviewing earlier goals for context");
        }
        let context = self.memory.recent_context(CONTEXT_WINDOW);
        let prompt = self.prompts.prompt_for(&context, goal);

        self.transition(PlanningStage::AwaitingCompletion);
        let completion = Arc::clone(&self.completion);
        let outcome = match completion.complete(&prompt).await {
            Ok(text) => PlanOutcome::Planned(text),
            Err(e) => {
                warn!(error = %e, "Completion failed");
                PlanOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        let mut text = outcome.render();
        let sequence_number = match &outcome {
            PlanOutcome::Planned(_) => Some(self.memory.record(goal, text.as_str()).sequence_number),
            PlanOutcome::Failed { .. } if self.record_failures => {
                Some(self.memory.record_failed(goal, text.as_str()).sequence_number)
            }
            PlanOutcome::Failed { .. } => None,
        };

        let mut research_attempted = false;
        let mut resources = Vec::new();
        if let Some(finder) = self.finder.clone() {
            if research::wants_research(goal) {
                self.transition(PlanningStage::Enriching);
                research_attempted = true;
                match finder.search(goal).await {
                    Ok(found) if !found.is_empty() => {
                        text.push_str(&research::format_resources(&found));
                        resources = found;
                    }
                    Ok(_) => debug!("Web research found nothing"),
                    Err(e) => warn!(error = %e, "Web research failed; plan sent without resources"),
                }
            }
        }

        let mut learning_style = None;
        if let Some(tagger) = self.tagger {
            learning_style = tagger.observe(&mut self.profile, goal);
            text = tagger.personalize(&text, learning_style);
        }

        self.transition(PlanningStage::Done);
        self.transition(PlanningStage::Idle);

        Ok(PlanReply {
            outcome,
            text,
            sequence_number,
            research_attempted,
            resources,
            learning_style,
        })
    }
}

/// Shared, stateless capabilities from which each session's coordinator is built.
#[derive(Clone)]
pub struct SessionFactory {
    completion: Arc<dyn CompletionClient>,
    finder: Option<Arc<dyn ResourceFinder>>,
    personalize: bool,
    record_failures: bool,
}

impl SessionFactory {
    pub fn new(completion: Arc<dyn CompletionClient>) -> Self {
        Self {
            completion,
            finder: None,
            personalize: false,
            record_failures: true,
        }
    }

    pub fn with_resource_finder(mut self, finder: Arc<dyn ResourceFinder>) -> Self {
        self.finder = Some(finder);
        self
    }

    pub fn personalize(mut self, personalize: bool) -> Self {
        self.personalize = personalize;
        self
    }

    pub fn record_failures(mut self, record: bool) -> Self {
        self.record_failures = record;
        self
    }

    pub fn from_config(config: &PlannerConfig) -> Result<Self, ConfigError> {
        let completion = llm_interaction::create_client(config)?;
        let mut factory = Self::new(completion)
            .personalize(config.personalize)
            .record_failures(config.record_failures);
        if config.research {
            let scraper = WebSearchScraper::new(config.http_client()?, config.search_url.clone());
            factory = factory.with_resource_finder(Arc::new(scraper));
        }
        Ok(factory)
    }

    pub fn new_session(&self) -> PlanningCoordinator {
        let mut coordinator =
            PlanningCoordinator::new(Arc::clone(&self.completion)).record_failures(self.record_failures);
        if let Some(finder) = &self.finder {
            coordinator = coordinator.with_resource_finder(Arc::clone(finder));
        }
        if self.personalize {
            coordinator = coordinator.with_tagger(PersonalizationTagger);
        }
        coordinator
    }
}
