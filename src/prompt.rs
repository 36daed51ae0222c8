use crate::constants::PERSONA;

/// Composes the single completion request sent for a goal.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    persona: String,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(PERSONA)
    }
}

impl PromptBuilder {
    pub fn new(persona: impl Into<String>) -> Self {
        Self {
            persona: persona.into(),
        }
    }

    pub fn persona(&self) -> &str {
        &self.persona
    }

    pub fn prompt_for(&self, context: &str, goal: &str) -> String {
        Self::build(&self.persona, context, goal)
    }

    /// Persona, context and goal followed by the four-section output template.
    /// The goal is embedded as-is, whatever its length.
    pub fn build(persona: &str, context: &str, goal: &str) -> String {
        format!(
            "{persona}\n\n\
             Context: {context}\n\n\
             Student's Goal: {goal}\n\n\
             Please create a comprehensive plan with this structure:\n\n\
             🎯 GOAL ANALYSIS:\n\
             - Understanding what the student wants to achieve\n\
             - Why this goal is important\n\
             - Potential challenges\n\n\
             📝 STRUCTURED PLAN:\n\
             [Create a step-by-step plan with:\n\
             1. Step description\n\
             2. Reasoning why this step is important\n\
             3. Estimated time\n\
             4. Resources needed\n\
             5. Success criteria]\n\n\
             🔍 ADDITIONAL RESEARCH:\n\
             [Mention if web research would be helpful for any step]\n\n\
             💡 TEACHER'S NOTES:\n\
             - Encouragement\n\
             - Tips for success\n\
             - What to focus on\n\n\
             Remember to be supportive and use teaching analogies!"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::NO_HISTORY;

    #[test]
    fn prompt_embeds_all_parts_in_order() {
        let prompt = PromptBuilder::default().prompt_for(NO_HISTORY, "Run a marathon");
        let persona_at = prompt.find("Professor Planwell").unwrap();
        let context_at = prompt.find(NO_HISTORY).unwrap();
        let goal_at = prompt.find("Student's Goal: Run a marathon").unwrap();
        assert!(persona_at < context_at && context_at < goal_at);
        for section in ["GOAL ANALYSIS", "STRUCTURED PLAN", "ADDITIONAL RESEARCH", "TEACHER'S NOTES"] {
            assert!(prompt.contains(section), "missing {section}");
        }
    }

    #[test]
    fn build_is_deterministic() {
        let a = PromptBuilder::build("p", "c", "g");
        let b = PromptBuilder::build("p", "c", "g");
        assert_eq!(a, b);
        assert!(a.starts_with("p\n\nContext: c\n\nStudent's Goal: g\n"));
    }

    #[test]
    fn long_goals_pass_through_untouched() {
        let goal = "step ".repeat(10_000);
        let prompt = PromptBuilder::new("persona").prompt_for("ctx", &goal);
        assert!(prompt.contains(&goal));
    }
}
