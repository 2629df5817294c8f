use std::collections::{BTreeMap, BTreeSet};

use super::domain::{
    ApplicantCategory, CategoryProfile, DocumentAttachment, DocumentKind, EntryContext,
    ProfileField,
};
use super::questions::QuestionCatalog;

/// First wizard step.
pub const FIRST_STEP: u8 = 1;

/// Mutable wizard state: the current step plus the in-progress form data.
///
/// All mutation goes through the narrow operations below; step transitions are
/// owned by the sequencer. Mutators report whether they changed anything so
/// callers can decide when a snapshot refresh is due.
#[derive(Debug, Clone, PartialEq)]
pub struct WizardSession {
    step: u8,
    opening: String,
    profile: Option<CategoryProfile>,
    answers: Vec<String>,
    selected_options: BTreeMap<String, BTreeSet<String>>,
    questionnaire_complete: bool,
}

impl WizardSession {
    pub fn new(entry: &EntryContext, catalog: &QuestionCatalog) -> Self {
        Self {
            step: FIRST_STEP,
            opening: entry.opening.clone(),
            profile: entry.category.map(CategoryProfile::empty),
            answers: vec![String::new(); catalog.total_questions()],
            selected_options: BTreeMap::new(),
            questionnaire_complete: false,
        }
    }

    pub(crate) fn from_parts(
        step: u8,
        opening: String,
        profile: Option<CategoryProfile>,
        answers: Vec<String>,
        selected_options: BTreeMap<String, BTreeSet<String>>,
        questionnaire_complete: bool,
    ) -> Self {
        Self {
            step,
            opening,
            profile,
            answers,
            selected_options,
            questionnaire_complete,
        }
    }

    pub fn step(&self) -> u8 {
        self.step
    }

    pub fn opening(&self) -> &str {
        &self.opening
    }

    pub fn category(&self) -> Option<ApplicantCategory> {
        self.profile.as_ref().map(CategoryProfile::category)
    }

    pub fn profile(&self) -> Option<&CategoryProfile> {
        self.profile.as_ref()
    }

    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    pub fn selected_options(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.selected_options
    }

    pub fn questionnaire_complete(&self) -> bool {
        self.questionnaire_complete
    }

    pub fn terminal_step(&self) -> Option<u8> {
        self.category().map(ApplicantCategory::terminal_step)
    }

    pub fn at_terminal(&self) -> bool {
        self.terminal_step() == Some(self.step)
    }

    /// One-time category selection for sessions whose entry link carried none.
    pub fn select_category(&mut self, category: ApplicantCategory) -> bool {
        if self.profile.is_some() {
            return false;
        }
        self.profile = Some(CategoryProfile::empty(category));
        true
    }

    pub fn set_field(&mut self, field: ProfileField, value: String) -> bool {
        match self.profile.as_mut() {
            Some(profile) => profile.set_field(field, value),
            None => false,
        }
    }

    /// Write into the fixed-length answer sequence. Out-of-bounds indices are
    /// dropped rather than resizing; resizing happens only when a snapshot is
    /// rehydrated.
    pub fn set_answer(&mut self, index: usize, value: String) -> bool {
        match self.answers.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn toggle_option(&mut self, question_id: &str, option: &str) {
        let selections = self.selected_options.entry(question_id.to_string()).or_default();
        if !selections.remove(option) {
            selections.insert(option.to_string());
        }
        if selections.is_empty() {
            self.selected_options.remove(question_id);
        }
    }

    pub fn set_questionnaire_complete(&mut self, complete: bool) -> bool {
        if self.questionnaire_complete == complete {
            return false;
        }
        self.questionnaire_complete = complete;
        true
    }

    pub fn attach_document(&mut self, kind: DocumentKind, attachment: DocumentAttachment) -> bool {
        match self.profile.as_mut() {
            Some(CategoryProfile::Agency(profile)) => {
                profile.documents.insert(kind, attachment);
                true
            }
            _ => false,
        }
    }

    pub fn remove_document(&mut self, kind: DocumentKind) -> bool {
        match self.profile.as_mut() {
            Some(CategoryProfile::Agency(profile)) => profile.documents.remove(&kind).is_some(),
            _ => false,
        }
    }

    /// Reinitialize the form to empty defaults sized to the current question
    /// set. The entry-derived opening and category survive.
    pub fn reset(&mut self, catalog: &QuestionCatalog) {
        self.step = FIRST_STEP;
        self.profile = self
            .profile
            .as_ref()
            .map(|profile| CategoryProfile::empty(profile.category()));
        self.answers = vec![String::new(); catalog.total_questions()];
        self.selected_options.clear();
        self.questionnaire_complete = false;
    }

    pub(crate) fn set_step(&mut self, step: u8) {
        self.step = step;
    }
}
