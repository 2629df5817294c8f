use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use member_intake::workflows::wizard::{
    ApplicationPayload, ProgressStore, ProgressStoreError, SubmissionError, SubmissionGateway,
    SubmissionReceipt,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Single-slot snapshot store held in process memory, for demos and tests.
#[derive(Default)]
pub(crate) struct InMemoryProgressStore {
    slot: Mutex<Option<String>>,
}

impl ProgressStore for InMemoryProgressStore {
    fn put(&self, payload: &str) -> Result<(), ProgressStoreError> {
        *self.slot.lock().expect("progress mutex poisoned") = Some(payload.to_string());
        Ok(())
    }

    fn get(&self) -> Result<Option<String>, ProgressStoreError> {
        Ok(self.slot.lock().expect("progress mutex poisoned").clone())
    }

    fn remove(&self) -> Result<(), ProgressStoreError> {
        *self.slot.lock().expect("progress mutex poisoned") = None;
        Ok(())
    }
}

/// Submission collaborator that keeps accepted applications in memory and
/// hands out sequential references.
#[derive(Default)]
pub(crate) struct RecordingSubmissionGateway {
    sequence: AtomicU64,
    submissions: Mutex<Vec<ApplicationPayload>>,
}

impl RecordingSubmissionGateway {
    pub(crate) fn submissions(&self) -> Vec<ApplicationPayload> {
        self.submissions
            .lock()
            .expect("submission mutex poisoned")
            .clone()
    }
}

impl SubmissionGateway for RecordingSubmissionGateway {
    fn submit(
        &self,
        application: &ApplicationPayload,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        self.submissions
            .lock()
            .expect("submission mutex poisoned")
            .push(application.clone());
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(SubmissionReceipt {
            reference: format!("mbr-{id:06}"),
        })
    }
}
