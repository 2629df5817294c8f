//! Multi-step membership application wizard.
//!
//! The wizard is a headless controller: an explicit session value object, a
//! reducer over an enumerated event set, durable single-slot progress
//! snapshots, and a submission hand-off behind a gateway trait.

pub mod domain;
pub mod persistence;
pub mod questions;
pub mod router;
pub mod sequencer;
pub mod service;
pub mod session;
pub mod submission;

#[cfg(test)]
mod tests;

pub use domain::{
    AgencyProfile, ApplicantCategory, CategoryProfile, DocumentAttachment, DocumentKind,
    EntryContext, EntryParams, FreelancerProfile, ProfileField, MAX_DOCUMENT_BYTES,
};
pub use persistence::{
    sanitize, FileProgressStore, ProgressStore, ProgressStoreError, ProgressTracker, SavedForm,
    SavedProgressRecord, SNAPSHOT_TTL_DAYS, SNAPSHOT_VERSION,
};
pub use questions::{QuestionCatalog, QuestionDefinition};
pub use router::wizard_router;
pub use sequencer::{can_advance, reduce, AdvanceRefusal, Reduction, WizardEvent};
pub use service::{
    DispatchResult, ResumeOffer, StartOutcome, TransitionKind, WizardService, WizardServiceError,
    WizardStateView,
};
pub use session::{WizardSession, FIRST_STEP};
pub use submission::{
    AnswerEntry, ApplicationPayload, DocumentSummary, SubmissionError, SubmissionGateway,
    SubmissionReceipt,
};
