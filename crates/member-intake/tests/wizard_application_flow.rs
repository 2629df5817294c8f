//! Integration scenarios for the membership application wizard.
//!
//! Scenarios exercise end-to-end behavior through the public service facade
//! and HTTP router so step gating, snapshot persistence, and the submission
//! hand-off are validated without reaching into private modules.

mod common {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};

    use member_intake::workflows::wizard::{
        ApplicationPayload, EntryParams, ProgressStore, ProgressStoreError, QuestionCatalog,
        QuestionDefinition, SubmissionError, SubmissionGateway, SubmissionReceipt, WizardService,
    };

    pub(super) fn catalog() -> QuestionCatalog {
        QuestionCatalog::new(vec![
            QuestionDefinition::new("experience_years", "Years in the discipline?", true),
            QuestionDefinition::new("specialties", "Primary specialties?", true),
            QuestionDefinition::new("availability", "Availability next quarter?", true),
        ])
    }

    pub(super) fn entry(job_type: &str) -> EntryParams {
        EntryParams {
            opening: Some("Staff Platform Engineer".to_string()),
            job_type: Some(job_type.to_string()),
        }
    }

    #[derive(Default)]
    pub(super) struct SlotStore {
        slot: Mutex<Option<String>>,
    }

    impl SlotStore {
        pub(super) fn is_empty(&self) -> bool {
            self.slot.lock().expect("store mutex poisoned").is_none()
        }
    }

    impl ProgressStore for SlotStore {
        fn put(&self, payload: &str) -> Result<(), ProgressStoreError> {
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

    #[derive(Default)]
    pub(super) struct RecordingGateway {
        sequence: AtomicU64,
        submissions: Mutex<Vec<ApplicationPayload>>,
    }

    impl RecordingGateway {
        pub(super) fn submissions(&self) -> Vec<ApplicationPayload> {
            self.submissions
                .lock()
                .expect("gateway mutex poisoned")
                .clone()
        }
    }

    impl SubmissionGateway for RecordingGateway {
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

    pub(super) fn build_service() -> (
        Arc<WizardService<SlotStore, RecordingGateway>>,
        Arc<SlotStore>,
        Arc<RecordingGateway>,
    ) {
        let store = Arc::new(SlotStore::default());
        let gateway = Arc::new(RecordingGateway::default());
        let service = Arc::new(WizardService::new(
            catalog(),
            store.clone(),
            gateway.clone(),
        ));
        (service, store, gateway)
    }
}

mod freelancer_flow {
    use super::common::*;
    use chrono::Utc;
    use member_intake::workflows::wizard::{
        ApplicantCategory, ProfileField, TransitionKind, WizardEvent,
    };

    #[test]
    fn submits_from_the_questionnaire_and_clears_progress() {
        let (service, store, gateway) = build_service();
        let now = Utc::now();

        let outcome = service.start(&entry("freelancers"), now);
        assert_eq!(outcome.state.category, Some("freelancer"));
        assert_eq!(outcome.state.max_steps, Some(3));

        for (field, value) in [
            (ProfileField::FullName, "Grace Hopper"),
            (ProfileField::ContactEmail, "grace@example.com"),
            (ProfileField::Phone, "+1 202 555 0100"),
        ] {
            service
                .dispatch(
                    WizardEvent::SetField {
                        field,
                        value: value.to_string(),
                    },
                    now,
                )
                .expect("session active");
        }

        let advanced = service
            .dispatch(WizardEvent::Advance, now)
            .expect("session active");
        assert_eq!(advanced.transition, TransitionKind::Advanced);

        for (index, answer) in ["twelve years", "compilers", "from October"]
            .iter()
            .enumerate()
        {
            service
                .dispatch(
                    WizardEvent::SetAnswer {
                        index,
                        value: answer.to_string(),
                    },
                    now,
                )
                .expect("session active");
        }
        service
            .dispatch(
                WizardEvent::SetQuestionnaireComplete { complete: true },
                now,
            )
            .expect("session active");

        let completed = service
            .dispatch(WizardEvent::Advance, now)
            .expect("session active");
        assert_eq!(completed.transition, TransitionKind::Completed);
        assert_eq!(completed.state.step, 3);
        assert!(completed.state.at_terminal);

        assert!(store.is_empty(), "confirmation clears the saved progress");

        let submissions = gateway.submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].category, ApplicantCategory::Freelancer);
        assert_eq!(submissions[0].answers.len(), 3);
        assert_eq!(submissions[0].answers[1].answer, "compilers");
    }
}

mod resume_flow {
    use super::common::*;
    use chrono::{Duration, Utc};
    use member_intake::workflows::wizard::{ProfileField, WizardEvent, WizardService};
    use std::sync::Arc;

    #[test]
    fn progress_survives_a_restart_and_is_sanitized_on_resume() {
        let (service, store, _) = build_service();
        let started = Utc::now();

        service.start(&entry("freelancers"), started);
        service
            .dispatch(
                WizardEvent::SetField {
                    field: ProfileField::FullName,
                    value: "Grace Hopper".to_string(),
                },
                started,
            )
            .expect("session active");
        service
            .dispatch(
                WizardEvent::SetAnswer {
                    index: 0,
                    value: "twelve years".to_string(),
                },
                started,
            )
            .expect("session active");
        drop(service);

        // A later visit backed by the same durable slot.
        let gateway = Arc::new(RecordingGateway::default());
        let revisit = WizardService::new(catalog(), store.clone(), gateway);
        let later = started + Duration::days(3);

        let outcome = revisit.start(&entry("freelancers"), later);
        let offer = outcome.resume.expect("fresh snapshot is offered");
        assert_eq!(offer.saved_at, started);

        let resumed = revisit.resume(later).expect("snapshot resumable");
        assert_eq!(resumed.answers[0], "twelve years");
        assert_eq!(
            resumed.fields.get("full_name").map(String::as_str),
            Some("Grace Hopper")
        );
        assert_eq!(resumed.answers.len(), catalog().total_questions());
    }

    #[test]
    fn month_old_progress_is_not_offered() {
        let (service, store, _) = build_service();
        let started = Utc::now();

        service.start(&entry("agencies"), started);
        service
            .dispatch(
                WizardEvent::SetField {
                    field: ProfileField::AgencyName,
                    value: "Harvard Mark I".to_string(),
                },
                started,
            )
            .expect("session active");
        drop(service);

        let gateway = Arc::new(RecordingGateway::default());
        let revisit = WizardService::new(catalog(), store.clone(), gateway);
        let later = started + Duration::days(31);

        let outcome = revisit.start(&entry("agencies"), later);
        assert!(outcome.resume.is_none());
        assert!(store.is_empty(), "stale snapshot was deleted");
    }
}

mod agency_routing {
    use super::common::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use member_intake::workflows::wizard::wizard_router;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn read_json(response: axum::response::Response) -> Value {
        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        serde_json::from_slice(&body).expect("json")
    }

    async fn post_event(router: &axum::Router, event: Value) -> Value {
        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/membership/wizard/session/events")
                    .header("content-type", "application/json")
                    .body(Body::from(event.to_string()))
                    .expect("request"),
            )
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        read_json(response).await
    }

    #[tokio::test]
    async fn walks_an_agency_application_end_to_end() {
        let (service, _, gateway) = build_service();
        let router = wizard_router(service);

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/membership/wizard/session?opening=Staff%20Platform%20Engineer&job_type=AGENCIES")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::CREATED);
        let payload = read_json(response).await;
        assert_eq!(payload["state"]["category"], json!("agency"));

        for (field, value) in [
            ("agency_name", "Harvard Mark I"),
            ("contact_name", "Howard Aiken"),
            ("contact_email", "lab@example.com"),
            ("phone", "+1 617 555 0100"),
        ] {
            post_event(
                &router,
                json!({ "type": "set_field", "field": field, "value": value }),
            )
            .await;
        }

        let questionnaire = post_event(&router, json!({ "type": "advance" })).await;
        assert_eq!(questionnaire["state"]["step"], json!(2));

        post_event(
            &router,
            json!({ "type": "set_answer", "index": 0, "value": "decades" }),
        )
        .await;
        post_event(
            &router,
            json!({ "type": "set_questionnaire_complete", "complete": true }),
        )
        .await;

        let documents = post_event(&router, json!({ "type": "advance" })).await;
        assert_eq!(documents["state"]["step"], json!(3));
        assert_eq!(documents["state"]["step_title"], json!("Documents"));

        let refused = post_event(&router, json!({ "type": "advance" })).await;
        assert_eq!(refused["transition"], json!("refused"));

        for kind in [
            "company_registration",
            "insurance_certificate",
            "tax_clearance",
            "portfolio_deck",
        ] {
            post_event(
                &router,
                json!({
                    "type": "attach_document",
                    "kind": kind,
                    "file_name": format!("{kind}.pdf"),
                    "size_bytes": 4096
                }),
            )
            .await;
        }

        let completed = post_event(&router, json!({ "type": "advance" })).await;
        assert_eq!(completed["transition"], json!("completed"));
        assert_eq!(completed["state"]["step"], json!(4));
        assert_eq!(completed["state"]["at_terminal"], json!(true));
        assert!(completed["receipt"]["reference"]
            .as_str()
            .expect("reference")
            .starts_with("mbr-"));

        assert_eq!(gateway.submissions().len(), 1);
        assert_eq!(gateway.submissions()[0].documents.len(), 4);
    }
}
