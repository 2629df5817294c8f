use serde::{Deserialize, Serialize};

/// Single questionnaire entry served to the wizard before it mounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDefinition {
    pub id: String,
    pub prompt: String,
    pub required: bool,
}

impl QuestionDefinition {
    pub fn new(id: &str, prompt: &str, required: bool) -> Self {
        Self {
            id: id.to_string(),
            prompt: prompt.to_string(),
            required,
        }
    }
}

/// Ordered question set, fixed for the lifetime of one wizard session. The
/// answer array of every session and snapshot is sized against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionCatalog {
    questions: Vec<QuestionDefinition>,
}

impl QuestionCatalog {
    pub fn new(questions: Vec<QuestionDefinition>) -> Self {
        Self { questions }
    }

    /// The built-in membership questionnaire used by the service and demos.
    pub fn standard() -> Self {
        Self::new(vec![
            QuestionDefinition::new(
                "experience_years",
                "How many years have you worked in your discipline?",
                true,
            ),
            QuestionDefinition::new(
                "specialties",
                "Which specialties best describe your practice?",
                true,
            ),
            QuestionDefinition::new(
                "notable_work",
                "Tell us about one engagement you are proud of.",
                true,
            ),
            QuestionDefinition::new(
                "collaboration_style",
                "How do you prefer to collaborate with client teams?",
                false,
            ),
            QuestionDefinition::new(
                "availability",
                "What is your availability over the next quarter?",
                true,
            ),
            QuestionDefinition::new(
                "referral_source",
                "How did you hear about the network?",
                false,
            ),
        ])
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    pub fn questions(&self) -> &[QuestionDefinition] {
        &self.questions
    }

    pub fn question(&self, ordinal: usize) -> Option<&QuestionDefinition> {
        self.questions.get(ordinal)
    }
}
