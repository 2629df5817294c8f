use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::workflows::wizard::domain::{
    DocumentAttachment, DocumentKind, EntryContext, EntryParams, ProfileField,
};
use crate::workflows::wizard::persistence::{ProgressStore, ProgressStoreError};
use crate::workflows::wizard::questions::{QuestionCatalog, QuestionDefinition};
use crate::workflows::wizard::service::WizardService;
use crate::workflows::wizard::session::WizardSession;
use crate::workflows::wizard::submission::{
    ApplicationPayload, SubmissionError, SubmissionGateway, SubmissionReceipt,
};

pub(super) fn catalog() -> QuestionCatalog {
    QuestionCatalog::new(
        (1..=5)
            .map(|ordinal| {
                QuestionDefinition::new(
                    &format!("q{ordinal}"),
                    &format!("Question {ordinal}"),
                    ordinal <= 3,
                )
            })
            .collect(),
    )
}

pub(super) fn freelancer_entry() -> EntryParams {
    EntryParams {
        opening: Some("Senior Rust Engineer".to_string()),
        job_type: Some("freelancers".to_string()),
    }
}

pub(super) fn agency_entry() -> EntryParams {
    EntryParams {
        opening: Some("Senior Rust Engineer".to_string()),
        job_type: Some("agencies".to_string()),
    }
}

pub(super) fn freelancer_session() -> WizardSession {
    WizardSession::new(&EntryContext::resolve(&freelancer_entry()), &catalog())
}

pub(super) fn agency_session() -> WizardSession {
    WizardSession::new(&EntryContext::resolve(&agency_entry()), &catalog())
}

pub(super) fn fill_freelancer_profile(session: &mut WizardSession) {
    session.set_field(ProfileField::FullName, "Ada Lovelace".to_string());
    session.set_field(ProfileField::ContactEmail, "ada@example.com".to_string());
    session.set_field(ProfileField::Phone, "+44 20 7946 0000".to_string());
}

pub(super) fn fill_agency_profile(session: &mut WizardSession) {
    session.set_field(ProfileField::AgencyName, "Analytical Engines Ltd".to_string());
    session.set_field(ProfileField::ContactName, "Charles Babbage".to_string());
    session.set_field(ProfileField::ContactEmail, "office@example.com".to_string());
    session.set_field(ProfileField::Phone, "+44 20 7946 0001".to_string());
}

pub(super) fn document(file_name: &str, size_bytes: u64) -> DocumentAttachment {
    DocumentAttachment {
        file_name: file_name.to_string(),
        size_bytes,
    }
}

pub(super) fn attach_all_documents(session: &mut WizardSession) {
    for kind in DocumentKind::required() {
        session.attach_document(kind, document(&format!("{}.pdf", kind.label()), 1024));
    }
}

#[derive(Default)]
pub(super) struct MemoryProgressStore {
    slot: Mutex<Option<String>>,
    puts: AtomicUsize,
}

impl MemoryProgressStore {
    pub(super) fn payload(&self) -> Option<String> {
        self.slot.lock().expect("store mutex poisoned").clone()
    }

    pub(super) fn put_count(&self) -> usize {
        self.puts.load(Ordering::Relaxed)
    }

    pub(super) fn seed(&self, payload: &str) {
        *self.slot.lock().expect("store mutex poisoned") = Some(payload.to_string());
    }
}

impl ProgressStore for MemoryProgressStore {
    fn put(&self, payload: &str) -> Result<(), ProgressStoreError> {
        self.puts.fetch_add(1, Ordering::Relaxed);
        *self.slot.lock().expect("store mutex poisoned") = Some(payload.to_string());
        Ok(())
    }

    fn get(&self) -> Result<Option<String>, ProgressStoreError> {
        Ok(self.slot.lock().expect("store mutex poisoned").clone())
    }

    fn remove(&self) -> Result<(), ProgressStoreError> {
        *self.slot.lock().expect("store mutex poisoned") = None;
        Ok(())
    }
}

/// Store that fails every operation, for the degrade-silently paths.
pub(super) struct FailingProgressStore;

impl ProgressStore for FailingProgressStore {
    fn put(&self, _payload: &str) -> Result<(), ProgressStoreError> {
        Err(ProgressStoreError::Unavailable("quota exceeded".to_string()))
    }

    fn get(&self) -> Result<Option<String>, ProgressStoreError> {
        Err(ProgressStoreError::Denied("private browsing".to_string()))
    }

    fn remove(&self) -> Result<(), ProgressStoreError> {
        Err(ProgressStoreError::Unavailable("quota exceeded".to_string()))
    }
}

#[derive(Default)]
pub(super) struct MemoryGateway {
    sequence: AtomicU64,
    submissions: Mutex<Vec<ApplicationPayload>>,
}

impl MemoryGateway {
    pub(super) fn submissions(&self) -> Vec<ApplicationPayload> {
        self.submissions.lock().expect("gateway mutex poisoned").clone()
    }
}

impl SubmissionGateway for MemoryGateway {
    fn submit(
        &self,
        application: &ApplicationPayload,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        self.submissions
            .lock()
            .expect("gateway mutex poisoned")
            .push(application.clone());
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(SubmissionReceipt {
            reference: format!("mbr-{id:06}"),
        })
    }
}

/// Gateway that refuses every submission.
pub(super) struct RejectingGateway;

impl SubmissionGateway for RejectingGateway {
    fn submit(
        &self,
        _application: &ApplicationPayload,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        Err(SubmissionError::Transport("connection reset".to_string()))
    }
}

pub(super) fn build_service() -> (
    Arc<WizardService<MemoryProgressStore, MemoryGateway>>,
    Arc<MemoryProgressStore>,
    Arc<MemoryGateway>,
) {
    let store = Arc::new(MemoryProgressStore::default());
    let gateway = Arc::new(MemoryGateway::default());
    let service = Arc::new(WizardService::new(catalog(), store.clone(), gateway.clone()));
    (service, store, gateway)
}

pub(super) fn build_service_with_gateway<G: SubmissionGateway + 'static>(
    gateway: Arc<G>,
) -> (
    Arc<WizardService<MemoryProgressStore, G>>,
    Arc<MemoryProgressStore>,
) {
    let store = Arc::new(MemoryProgressStore::default());
    let service = Arc::new(WizardService::new(catalog(), store.clone(), gateway));
    (service, store)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
