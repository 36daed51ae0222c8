use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningStyle {
    Visual,
    Auditory,
    Kinesthetic,
}

impl LearningStyle {
    /// Detection order. The first style with a matching keyword wins.
    pub const ALL: [LearningStyle; 3] = [
        LearningStyle::Visual,
        LearningStyle::Auditory,
        LearningStyle::Kinesthetic,
    ];

    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            LearningStyle::Visual => &["see", "show", "visual", "picture", "diagram"],
            LearningStyle::Auditory => &["hear", "listen", "talk", "discuss"],
            LearningStyle::Kinesthetic => &["do", "practice", "hands-on", "try"],
        }
    }

    pub fn tip(self) -> &'static str {
        match self {
            LearningStyle::Visual => {
                "\n👁️ **Visual Learner Tip**: Try creating mind maps or diagrams for each step!"
            }
            LearningStyle::Auditory => {
                "\n👂 **Auditory Learner Tip**: Explain each step out loud or discuss with a study partner!"
            }
            LearningStyle::Kinesthetic => {
                "\n🖐️ **Hands-On Tip**: Practice each concept immediately after learning it!"
            }
        }
    }
}

/// What the session has learned about the student. Last detection wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StudentProfile {
    pub learning_style: Option<LearningStyle>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PersonalizationTagger;

impl PersonalizationTagger {
    /// Substring scan over the lowercased text; "do" matches "document" as well.
    pub fn detect(&self, text: &str) -> Option<LearningStyle> {
        let lowered = text.to_lowercase();
        LearningStyle::ALL
            .into_iter()
            .find(|style| style.keywords().iter().any(|keyword| lowered.contains(keyword)))
    }

    /// Detects a style in `text` and, if found, overwrites the profile's style.
    pub fn observe(&self, profile: &mut StudentProfile, text: &str) -> Option<LearningStyle> {
        let detected = self.detect(text);
        if detected.is_some() {
            profile.learning_style = detected;
        }
        detected
    }

    pub fn personalize(&self, plan: &str, style: Option<LearningStyle>) -> String {
        match style {
            Some(style) => format!("{plan}{}", style.tip()),
            None => plan.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_each_style() {
        let tagger = PersonalizationTagger;
        assert_eq!(tagger.detect("Show me a DIAGRAM"), Some(LearningStyle::Visual));
        assert_eq!(tagger.detect("I like to listen to podcasts"), Some(LearningStyle::Auditory));
        assert_eq!(tagger.detect("hands-on labs please"), Some(LearningStyle::Kinesthetic));
        assert_eq!(tagger.detect("plan my week"), None);
    }

    #[test]
    fn first_style_in_order_wins() {
        // "discuss" (auditory) and "picture" (visual) both present
        assert_eq!(
            PersonalizationTagger.detect("discuss the picture"),
            Some(LearningStyle::Visual)
        );
    }

    #[test]
    fn last_detection_overwrites_profile() {
        let tagger = PersonalizationTagger;
        let mut profile = StudentProfile::default();
        tagger.observe(&mut profile, "let me talk it through");
        assert_eq!(profile.learning_style, Some(LearningStyle::Auditory));
        tagger.observe(&mut profile, "I learn by seeing");
        assert_eq!(profile.learning_style, Some(LearningStyle::Visual));
        tagger.observe(&mut profile, "plan my week");
        assert_eq!(profile.learning_style, Some(LearningStyle::Visual));
    }

    #[test]
    fn personalize_appends_one_tip() {
        let tagger = PersonalizationTagger;
        let out = tagger.personalize("Plan", Some(LearningStyle::Kinesthetic));
        assert!(out.starts_with("Plan\n"));
        assert!(out.contains("Hands-On Tip"));
        assert_eq!(tagger.personalize("Plan", None), "Plan");
    }
}
