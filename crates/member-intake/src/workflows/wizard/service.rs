use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{ApplicantCategory, EntryContext, EntryParams};
use super::persistence::{sanitize, ProgressStore, ProgressTracker};
use super::questions::QuestionCatalog;
use super::sequencer::{reduce, step_notice, Reduction, WizardEvent};
use super::session::{WizardSession, FIRST_STEP};
use super::submission::{ApplicationPayload, DocumentSummary, SubmissionGateway, SubmissionReceipt};

/// Facade composing the session, snapshot tracker, and submission gateway.
///
/// One active session at a time, guarded by a mutex; a new application
/// overwrites any prior in-progress one, matching the single-slot snapshot.
pub struct WizardService<S, G> {
    catalog: QuestionCatalog,
    tracker: ProgressTracker<S>,
    gateway: Arc<G>,
    session: Mutex<Option<WizardSession>>,
}

/// Read-only projection of the session for API responses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WizardStateView {
    pub step: u8,
    pub step_title: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_steps: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<&'static str>,
    pub opening: String,
    pub fields: BTreeMap<&'static str, String>,
    pub answers: Vec<String>,
    pub selected_options: BTreeMap<String, BTreeSet<String>>,
    pub questionnaire_complete: bool,
    pub documents: Vec<DocumentSummary>,
    pub at_terminal: bool,
}

impl WizardStateView {
    pub(crate) fn project(session: &WizardSession) -> Self {
        let step_title = match session.category() {
            Some(category) => category.step_title(session.step()),
            None => "Profile",
        };

        let documents = session
            .profile()
            .and_then(|profile| profile.documents())
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

        Self {
            step: session.step(),
            step_title,
            max_steps: session.category().map(ApplicantCategory::max_steps),
            category: session.category().map(ApplicantCategory::label),
            opening: session.opening().to_string(),
            fields: session.profile().map(|profile| profile.fields()).unwrap_or_default(),
            answers: session.answers().to_vec(),
            selected_options: session.selected_options().clone(),
            questionnaire_complete: session.questionnaire_complete(),
            documents,
            at_terminal: session.at_terminal(),
        }
    }
}

/// Outcome of starting a fresh session.
#[derive(Debug, Clone, Serialize)]
pub struct StartOutcome {
    pub state: WizardStateView,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume: Option<ResumeOffer>,
}

/// Advertises resumable saved progress found at start.
#[derive(Debug, Clone, Serialize)]
pub struct ResumeOffer {
    pub step: u8,
    pub saved_at: DateTime<Utc>,
}

/// What a dispatched event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Updated,
    Advanced,
    SteppedBack,
    Refused,
    Completed,
    SubmissionFailed,
    Unchanged,
}

/// Full dispatch outcome returned to callers and serialized over HTTP.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchResult {
    pub transition: TransitionKind,
    pub state: WizardStateView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub field_errors: BTreeMap<&'static str, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<SubmissionReceipt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DispatchResult {
    fn new(transition: TransitionKind, session: &WizardSession) -> Self {
        Self {
            transition,
            state: WizardStateView::project(session),
            notice: None,
            field_errors: BTreeMap::new(),
            receipt: None,
            error: None,
        }
    }
}

/// Error raised by the wizard facade.
#[derive(Debug, thiserror::Error)]
pub enum WizardServiceError {
    #[error("no active wizard session")]
    NoSession,
    #[error("no saved progress to resume")]
    NothingToResume,
}

impl<S, G> WizardService<S, G>
where
    S: ProgressStore + 'static,
    G: SubmissionGateway + 'static,
{
    pub fn new(catalog: QuestionCatalog, store: Arc<S>, gateway: Arc<G>) -> Self {
        Self {
            catalog,
            tracker: ProgressTracker::new(store),
            gateway,
            session: Mutex::new(None),
        }
    }

    pub fn catalog(&self) -> &QuestionCatalog {
        &self.catalog
    }

    /// Begin a fresh session from entry-link parameters, offering a resume
    /// when a fresh snapshot exists.
    pub fn start(&self, params: &EntryParams, now: DateTime<Utc>) -> StartOutcome {
        let entry = EntryContext::resolve(params);
        for warning in &entry.warnings {
            warn!(%warning, "wizard entry parameter rejected");
        }

        let resume = self.tracker.load(now).map(|record| ResumeOffer {
            step: record.step.clamp(FIRST_STEP, 4),
            saved_at: record.timestamp,
        });

        let session = WizardSession::new(&entry, &self.catalog);
        let state = WizardStateView::project(&session);
        *self.lock_session() = Some(session);

        info!(
            opening = %state.opening,
            category = state.category.unwrap_or("unset"),
            "wizard session started"
        );

        StartOutcome {
            state,
            warnings: entry.warnings,
            resume,
        }
    }

    /// Rehydrate the saved snapshot as the active session.
    pub fn resume(&self, now: DateTime<Utc>) -> Result<WizardStateView, WizardServiceError> {
        let record = self
            .tracker
            .load(now)
            .ok_or(WizardServiceError::NothingToResume)?;

        let session = sanitize(record, &self.catalog);
        let state = WizardStateView::project(&session);
        *self.lock_session() = Some(session);

        info!(step = state.step, "wizard session resumed from snapshot");
        Ok(state)
    }

    /// Current state of the active session.
    pub fn state(&self) -> Result<WizardStateView, WizardServiceError> {
        self.lock_session()
            .as_ref()
            .map(WizardStateView::project)
            .ok_or(WizardServiceError::NoSession)
    }

    /// Apply one event. Snapshots are refreshed after every change while the
    /// session sits before its terminal step and cleared once it arrives
    /// there.
    pub fn dispatch(
        &self,
        event: WizardEvent,
        now: DateTime<Utc>,
    ) -> Result<DispatchResult, WizardServiceError> {
        let mut guard = self.lock_session();
        let session = guard.as_mut().ok_or(WizardServiceError::NoSession)?;

        let result = match reduce(session, event, &self.catalog) {
            Reduction::Updated => {
                self.snapshot(session, now);
                DispatchResult::new(TransitionKind::Updated, session)
            }
            Reduction::Advanced { to, notice } => {
                self.snapshot(session, now);
                info!(step = to, "wizard advanced");
                let mut result = DispatchResult::new(TransitionKind::Advanced, session);
                result.notice = Some(notice);
                result
            }
            Reduction::SteppedBack { to, notice } => {
                self.snapshot(session, now);
                info!(step = to, "wizard stepped back");
                let mut result = DispatchResult::new(TransitionKind::SteppedBack, session);
                result.notice = Some(notice);
                result
            }
            Reduction::Refused(refusal) => {
                let mut result = DispatchResult::new(TransitionKind::Refused, session);
                result.notice = Some(refusal.notice);
                result.field_errors = refusal.errors;
                result
            }
            Reduction::Unchanged => DispatchResult::new(TransitionKind::Unchanged, session),
            Reduction::SubmissionRequired { terminal } => {
                self.submit(session, terminal)
            }
        };

        Ok(result)
    }

    fn submit(&self, session: &mut WizardSession, terminal: u8) -> DispatchResult {
        let Some(payload) = ApplicationPayload::from_session(session, &self.catalog) else {
            // Unreachable past the step-1 gate, but refusing beats panicking.
            let mut result = DispatchResult::new(TransitionKind::Refused, session);
            result
                .field_errors
                .insert("category", "pick agency or freelancer to continue".to_string());
            return result;
        };

        match self.gateway.submit(&payload) {
            Ok(receipt) => {
                session.set_step(terminal);
                self.tracker.clear();
                info!(reference = %receipt.reference, "application submitted");
                let mut result = DispatchResult::new(TransitionKind::Completed, session);
                result.notice = Some(step_notice(payload.category, terminal));
                result.receipt = Some(receipt);
                result
            }
            Err(err) => {
                warn!(%err, "application submission failed");
                let mut result = DispatchResult::new(TransitionKind::SubmissionFailed, session);
                result.error = Some(err.to_string());
                result
            }
        }
    }

    fn snapshot(&self, session: &WizardSession, now: DateTime<Utc>) {
        if session
            .terminal_step()
            .map_or(true, |terminal| session.step() < terminal)
        {
            self.tracker.save(session, now);
        }
    }

    fn lock_session(&self) -> std::sync::MutexGuard<'_, Option<WizardSession>> {
        self.session.lock().expect("wizard session mutex poisoned")
    }
}
