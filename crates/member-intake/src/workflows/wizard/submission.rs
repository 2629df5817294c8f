use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::domain::{ApplicantCategory, DocumentKind};
use super::questions::QuestionCatalog;
use super::session::WizardSession;

/// Completed form handed to the submission collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationPayload {
    pub opening: String,
    pub category: ApplicantCategory,
    pub fields: BTreeMap<String, String>,
    pub answers: Vec<AnswerEntry>,
    pub selected_options: BTreeMap<String, BTreeSet<String>>,
    pub documents: Vec<DocumentSummary>,
}

/// Free-text answer paired with its question id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerEntry {
    pub question_id: String,
    pub answer: String,
}

/// Attachment metadata forwarded with the submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub kind: DocumentKind,
    pub file_name: String,
    pub size_bytes: u64,
}

impl ApplicationPayload {
    /// Build the outbound payload from a session that passed its final gate.
    /// Returns `None` when no category was ever selected.
    pub fn from_session(session: &WizardSession, catalog: &QuestionCatalog) -> Option<Self> {
        let profile = session.profile()?;

        let answers = catalog
            .questions()
            .iter()
            .zip(session.answers())
            .map(|(question, answer)| AnswerEntry {
                question_id: question.id.clone(),
                answer: answer.clone(),
            })
            .collect();

        let documents = profile
            .documents()
            .map(|documents| {
                documents
                    .iter()
                    .map(|(kind, attachment)| DocumentSummary {
                        kind: *kind,
                        file_name: attachment.file_name.clone(),
                        size_bytes: attachment.size_bytes,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            opening: session.opening().to_string(),
            category: profile.category(),
            fields: profile
                .fields()
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
            answers,
            selected_options: session.selected_options().clone(),
            documents,
        })
    }
}

/// Acknowledgement returned by the submission collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub reference: String,
}

/// Outbound submission seam; the wizard only consumes the outcome.
pub trait SubmissionGateway: Send + Sync {
    fn submit(&self, application: &ApplicationPayload)
        -> Result<SubmissionReceipt, SubmissionError>;
}

/// Submission failure taxonomy. The wizard stays on its current step in either
/// case and never retries on its own.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("submission transport failed: {0}")]
    Transport(String),
    #[error("submission rejected: {0}")]
    Rejected(String),
}
