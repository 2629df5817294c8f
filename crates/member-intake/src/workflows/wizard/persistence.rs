use std::collections::{BTreeMap, BTreeSet};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::domain::{ApplicantCategory, CategoryProfile};
use super::questions::QuestionCatalog;
use super::session::WizardSession;

/// Snapshot schema tag; bump when the saved layout changes shape.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Saved progress older than this is discarded instead of resumed.
pub const SNAPSHOT_TTL_DAYS: i64 = 30;

const MIN_STEP: u8 = 1;
const MAX_STEP: u8 = 4;

/// Durable snapshot of an in-progress application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedProgressRecord {
    pub step: u8,
    pub form_data: SavedForm,
    pub timestamp: DateTime<Utc>,
    pub version: u32,
}

/// Serialized form payload. String fields tolerate `null` on the way in; the
/// sanitizer coerces them back to the empty-string sentinel. File attachments
/// are never written and come back absent after a resume.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SavedForm {
    #[serde(default)]
    pub opening: Option<String>,
    #[serde(default)]
    pub category: Option<ApplicantCategory>,
    #[serde(default)]
    pub fields: BTreeMap<String, Option<String>>,
    #[serde(default)]
    pub answers: Vec<String>,
    #[serde(default)]
    pub selected_options: BTreeMap<String, BTreeSet<String>>,
    #[serde(default)]
    pub questionnaire_complete: bool,
}

impl SavedForm {
    pub fn from_session(session: &WizardSession) -> Self {
        let fields = session
            .profile()
            .map(|profile| {
                profile
                    .fields()
                    .into_iter()
                    .map(|(name, value)| (name.to_string(), Some(value)))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            opening: Some(session.opening().to_string()),
            category: session.category(),
            fields,
            answers: session.answers().to_vec(),
            selected_options: session.selected_options().clone(),
            questionnaire_complete: session.questionnaire_complete(),
        }
    }
}

/// Single-slot durable storage seam, last-writer-wins. Concurrent writers are
/// not coordinated; the last save wins.
pub trait ProgressStore: Send + Sync {
    fn put(&self, payload: &str) -> Result<(), ProgressStoreError>;
    fn get(&self) -> Result<Option<String>, ProgressStoreError>;
    fn remove(&self) -> Result<(), ProgressStoreError>;
}

/// Storage failure taxonomy for the snapshot slot.
#[derive(Debug, thiserror::Error)]
pub enum ProgressStoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage access denied: {0}")]
    Denied(String),
}

/// Save/load/clear orchestration over a [`ProgressStore`]. Storage failures
/// degrade to a warning and never block the current interaction.
pub struct ProgressTracker<S> {
    store: Arc<S>,
}

impl<S: ProgressStore> ProgressTracker<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Overwrite the slot with the current session state.
    pub fn save(&self, session: &WizardSession, now: DateTime<Utc>) {
        let record = SavedProgressRecord {
            step: session.step(),
            form_data: SavedForm::from_session(session),
            timestamp: now,
            version: SNAPSHOT_VERSION,
        };

        let payload = match serde_json::to_string(&record) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(%err, "failed to encode wizard snapshot");
                return;
            }
        };

        if let Err(err) = self.store.put(&payload) {
            warn!(%err, "failed to persist wizard snapshot");
        }
    }

    /// Read the slot. Absent, unparsable, structurally bad, or stale records
    /// yield `None`; the bad ones are deleted on the way out.
    pub fn load(&self, now: DateTime<Utc>) -> Option<SavedProgressRecord> {
        let payload = match self.store.get() {
            Ok(Some(payload)) => payload,
            Ok(None) => return None,
            Err(err) => {
                warn!(%err, "failed to read wizard snapshot");
                self.discard();
                return None;
            }
        };

        let record: SavedProgressRecord = match serde_json::from_str(&payload) {
            Ok(record) => record,
            Err(err) => {
                warn!(%err, "discarding unparsable wizard snapshot");
                self.discard();
                return None;
            }
        };

        if now.signed_duration_since(record.timestamp) > Duration::days(SNAPSHOT_TTL_DAYS) {
            self.discard();
            return None;
        }

        Some(record)
    }

    /// Delete the slot. Invoked unconditionally at the terminal step.
    pub fn clear(&self) {
        self.discard();
    }

    fn discard(&self) {
        if let Err(err) = self.store.remove() {
            warn!(%err, "failed to delete wizard snapshot");
        }
    }
}

/// Normalize a snapshot against the currently served question set.
///
/// The step is clamped into the valid range, the answer sequence is rebuilt to
/// exactly the catalog length (padding with empty strings, dropping excess),
/// and every declared string field is coerced away from `null`. File fields
/// stay absent: attachments cannot be restored across reloads.
pub fn sanitize(record: SavedProgressRecord, catalog: &QuestionCatalog) -> WizardSession {
    let SavedProgressRecord {
        step, form_data, ..
    } = record;

    let mut step = step.clamp(MIN_STEP, MAX_STEP);
    if let Some(category) = form_data.category {
        step = step.min(category.terminal_step());
    }

    let mut answers = form_data.answers;
    answers.resize(catalog.total_questions(), String::new());

    let profile = form_data
        .category
        .map(|category| CategoryProfile::from_saved(category, &form_data.fields));

    WizardSession::from_parts(
        step,
        form_data.opening.unwrap_or_default(),
        profile,
        answers,
        form_data.selected_options,
        form_data.questionnaire_complete,
    )
}

/// Snapshot slot backed by a single JSON file on disk.
pub struct FileProgressStore {
    path: PathBuf,
}

impl FileProgressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl ProgressStore for FileProgressStore {
    fn put(&self, payload: &str) -> Result<(), ProgressStoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(store_error)?;
            }
        }
        std::fs::write(&self.path, payload).map_err(store_error)
    }

    fn get(&self) -> Result<Option<String>, ProgressStoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(payload) => Ok(Some(payload)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(store_error(err)),
        }
    }

    fn remove(&self) -> Result<(), ProgressStoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(store_error(err)),
        }
    }
}

fn store_error(err: std::io::Error) -> ProgressStoreError {
    match err.kind() {
        ErrorKind::PermissionDenied => ProgressStoreError::Denied(err.to_string()),
        _ => ProgressStoreError::Unavailable(err.to_string()),
    }
}
