use crate::infra::{InMemoryProgressStore, RecordingSubmissionGateway};
use chrono::Utc;
use clap::Args;
use std::sync::Arc;

use member_intake::error::AppError;
use member_intake::workflows::wizard::{
    DispatchResult, DocumentKind, EntryParams, ProfileField, ProgressStore, QuestionCatalog,
    TransitionKind, WizardEvent, WizardService,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Job title carried in the entry link
    #[arg(long)]
    pub(crate) opening: Option<String>,
    /// Applicant category for the entry link (agencies or freelancers)
    #[arg(long)]
    pub(crate) job_type: Option<String>,
    /// Skip the simulated restart-and-resume portion of the demo
    #[arg(long)]
    pub(crate) skip_resume: bool,
}

type DemoService = WizardService<InMemoryProgressStore, RecordingSubmissionGateway>;

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let opening = args
        .opening
        .unwrap_or_else(|| "Senior Rust Engineer".to_string());
    let job_type = args.job_type.unwrap_or_else(|| "agencies".to_string());

    println!("Membership application wizard demo");

    let store = Arc::new(InMemoryProgressStore::default());
    let gateway = Arc::new(RecordingSubmissionGateway::default());
    let service = WizardService::new(QuestionCatalog::standard(), store.clone(), gateway.clone());

    let entry = EntryParams {
        opening: Some(opening.clone()),
        job_type: Some(job_type),
    };
    let outcome = service.start(&entry, Utc::now());
    for warning in &outcome.warnings {
        println!("  warning: {warning}");
    }
    println!(
        "Started for opening '{}' as {} ({} steps)",
        outcome.state.opening,
        outcome.state.category.unwrap_or("unset"),
        outcome
            .state
            .max_steps
            .map(|steps| steps.to_string())
            .unwrap_or_else(|| "?".to_string())
    );

    // An eager advance shows the inline validation.
    let Some(refused) = apply(&service, WizardEvent::Advance) else {
        return Ok(());
    };
    render(&refused);

    let is_agency = outcome.state.category == Some("agency");
    let profile_fields: &[(ProfileField, &str)] = if is_agency {
        &[
            (ProfileField::AgencyName, "Analytical Engines Ltd"),
            (ProfileField::ContactName, "Charles Babbage"),
            (ProfileField::ContactEmail, "office@example.com"),
            (ProfileField::Phone, "+44 20 7946 0001"),
        ]
    } else {
        &[
            (ProfileField::FullName, "Ada Lovelace"),
            (ProfileField::ContactEmail, "ada@example.com"),
            (ProfileField::Phone, "+44 20 7946 0000"),
        ]
    };
    for (field, value) in profile_fields {
        if apply(
            &service,
            WizardEvent::SetField {
                field: *field,
                value: (*value).to_string(),
            },
        )
        .is_none()
        {
            return Ok(());
        }
    }

    let Some(advanced) = apply(&service, WizardEvent::Advance) else {
        return Ok(());
    };
    render(&advanced);

    for (index, answer) in ["Twelve years", "Distributed systems", "A payments platform"]
        .iter()
        .enumerate()
    {
        apply(
            &service,
            WizardEvent::SetAnswer {
                index,
                value: (*answer).to_string(),
            },
        );
    }
    apply(
        &service,
        WizardEvent::ToggleOption {
            question_id: "specialties".to_string(),
            option: "backend".to_string(),
        },
    );
    apply(
        &service,
        WizardEvent::SetQuestionnaireComplete { complete: true },
    );

    let service = if args.skip_resume {
        service
    } else {
        println!("\nSimulated restart: a fresh visit backed by the same snapshot slot");
        let restarted =
            WizardService::new(QuestionCatalog::standard(), store.clone(), gateway.clone());
        let revisit = restarted.start(&entry, Utc::now());
        match revisit.resume {
            Some(offer) => println!("  saved progress found at step {}", offer.step),
            None => println!("  no saved progress found"),
        }
        match restarted.resume(Utc::now()) {
            Ok(state) => println!(
                "  resumed at step {} with {} answered question(s)",
                state.step,
                state.answers.iter().filter(|answer| !answer.is_empty()).count()
            ),
            Err(err) => println!("  resume unavailable: {err}"),
        }
        restarted
    };

    let Some(next) = apply(&service, WizardEvent::Advance) else {
        return Ok(());
    };
    render(&next);

    if next.state.step_title == "Documents" {
        // One oversized attachment first, to show the limit at work.
        apply(
            &service,
            WizardEvent::AttachDocument {
                kind: DocumentKind::CompanyRegistration,
                file_name: "registration-scan.pdf".to_string(),
                size_bytes: 6 * 1024 * 1024,
            },
        );
        if let Some(refused) = apply(&service, WizardEvent::Advance) {
            render(&refused);
        }

        for kind in DocumentKind::required() {
            apply(
                &service,
                WizardEvent::AttachDocument {
                    kind,
                    file_name: format!("{}.pdf", kind.label()),
                    size_bytes: 512 * 1024,
                },
            );
        }
        let Some(completed) = apply(&service, WizardEvent::Advance) else {
            return Ok(());
        };
        render(&completed);
    }

    for submission in gateway.submissions() {
        println!(
            "\nAccepted application for '{}' ({}) with {} answer(s) and {} document(s)",
            submission.opening,
            submission.category.label(),
            submission.answers.len(),
            submission.documents.len()
        );
    }

    match store.get() {
        Ok(None) => println!("Snapshot slot is empty again"),
        Ok(Some(_)) => println!("Snapshot slot still holds in-progress work"),
        Err(err) => println!("Snapshot slot unreadable: {err}"),
    }

    Ok(())
}

fn apply(service: &DemoService, event: WizardEvent) -> Option<DispatchResult> {
    match service.dispatch(event, Utc::now()) {
        Ok(result) => Some(result),
        Err(err) => {
            println!("  wizard unavailable: {err}");
            None
        }
    }
}

fn render(result: &DispatchResult) {
    match result.transition {
        TransitionKind::Advanced | TransitionKind::SteppedBack | TransitionKind::Completed => {
            if let Some(notice) = &result.notice {
                println!("-> {notice}");
            }
            if let Some(receipt) = &result.receipt {
                println!("   receipt {}", receipt.reference);
            }
        }
        TransitionKind::Refused => {
            println!("-> blocked at step {}", result.state.step);
            for (field, message) in &result.field_errors {
                println!("   {field}: {message}");
            }
        }
        TransitionKind::SubmissionFailed => {
            if let Some(error) = &result.error {
                println!("-> submission failed: {error}");
            }
        }
        TransitionKind::Updated | TransitionKind::Unchanged => {}
    }
}
