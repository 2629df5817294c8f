use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{ApplicantCategory, DocumentAttachment, DocumentKind, ProfileField};
use super::questions::QuestionCatalog;
use super::session::{WizardSession, FIRST_STEP};

/// Enumerated wizard events. The reducer below is the only way state changes,
/// which keeps the controller testable without any rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WizardEvent {
    SelectCategory {
        category: ApplicantCategory,
    },
    SetField {
        field: ProfileField,
        value: String,
    },
    SetAnswer {
        index: usize,
        value: String,
    },
    ToggleOption {
        question_id: String,
        option: String,
    },
    SetQuestionnaireComplete {
        complete: bool,
    },
    AttachDocument {
        kind: DocumentKind,
        file_name: String,
        size_bytes: u64,
    },
    RemoveDocument {
        kind: DocumentKind,
    },
    Advance,
    Back,
    Reset,
}

/// Why an `Advance` was refused, with the per-field error map for inline
/// display. Refusals are ordinary outcomes, never errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvanceRefusal {
    pub step: u8,
    pub errors: BTreeMap<&'static str, String>,
    pub notice: String,
}

/// Result of applying one event to a session.
#[derive(Debug, Clone, PartialEq)]
pub enum Reduction {
    /// Form data changed; the snapshot should be refreshed.
    Updated,
    /// Moved to a non-terminal step.
    Advanced { to: u8, notice: String },
    /// Validated end of the form. The caller runs the submission and, on
    /// success, completes the session at the terminal step.
    SubmissionRequired { terminal: u8 },
    Refused(AdvanceRefusal),
    SteppedBack { to: u8, notice: String },
    /// The event had no effect (back at step 1, foreign field, out-of-bounds
    /// answer index, repeated category selection).
    Unchanged,
}

/// Apply one event to the session.
pub fn reduce(
    session: &mut WizardSession,
    event: WizardEvent,
    catalog: &QuestionCatalog,
) -> Reduction {
    match event {
        WizardEvent::SelectCategory { category } => {
            changed(session.select_category(category))
        }
        WizardEvent::SetField { field, value } => changed(session.set_field(field, value)),
        WizardEvent::SetAnswer { index, value } => changed(session.set_answer(index, value)),
        WizardEvent::ToggleOption {
            question_id,
            option,
        } => {
            session.toggle_option(&question_id, &option);
            Reduction::Updated
        }
        WizardEvent::SetQuestionnaireComplete { complete } => {
            changed(session.set_questionnaire_complete(complete))
        }
        WizardEvent::AttachDocument {
            kind,
            file_name,
            size_bytes,
        } => changed(session.attach_document(
            kind,
            DocumentAttachment {
                file_name,
                size_bytes,
            },
        )),
        WizardEvent::RemoveDocument { kind } => changed(session.remove_document(kind)),
        WizardEvent::Advance => advance(session),
        WizardEvent::Back => back(session),
        WizardEvent::Reset => {
            session.reset(catalog);
            Reduction::Updated
        }
    }
}

/// Gate for the current step. An empty error map means the step may be passed.
pub fn can_advance(session: &WizardSession) -> Result<(), AdvanceRefusal> {
    let step = session.step();
    let mut errors = BTreeMap::new();

    match step {
        1 => match session.profile() {
            None => {
                errors.insert(
                    "category",
                    "pick agency or freelancer to continue".to_string(),
                );
            }
            Some(profile) => errors.extend(profile.field_errors()),
        },
        2 => {
            // Completion is reported by the question-set component, not
            // derived here.
            if !session.questionnaire_complete() {
                errors.insert("questionnaire", "finish the questionnaire first".to_string());
            }
        }
        3 if session.category() == Some(ApplicantCategory::Agency) => {
            let documents = session
                .profile()
                .and_then(|profile| profile.documents())
                .cloned()
                .unwrap_or_default();
            for kind in DocumentKind::required() {
                match documents.get(&kind) {
                    None => {
                        errors.insert(
                            kind.label(),
                            format!("{} is required", kind.label().replace('_', " ")),
                        );
                    }
                    Some(attachment) if !attachment.within_limit() => {
                        errors.insert(
                            kind.label(),
                            format!("{} exceeds the 5 MiB limit", attachment.file_name),
                        );
                    }
                    Some(_) => {}
                }
            }
        }
        _ => {}
    }

    if errors.is_empty() {
        Ok(())
    } else {
        let notice = format!(
            "step {step} has {} unresolved field(s)",
            errors.len()
        );
        Err(AdvanceRefusal {
            step,
            errors,
            notice,
        })
    }
}

fn advance(session: &mut WizardSession) -> Reduction {
    if session.at_terminal() {
        return Reduction::Unchanged;
    }

    if let Err(refusal) = can_advance(session) {
        return Reduction::Refused(refusal);
    }

    // Step 1 cannot be passed without a category, so one exists here.
    let Some(category) = session.category() else {
        return Reduction::Unchanged;
    };

    let next = session.step() + 1;
    if next == category.terminal_step() {
        return Reduction::SubmissionRequired {
            terminal: category.terminal_step(),
        };
    }

    session.set_step(next);
    Reduction::Advanced {
        to: next,
        notice: step_notice(category, next),
    }
}

fn back(session: &mut WizardSession) -> Reduction {
    if session.step() <= FIRST_STEP {
        return Reduction::Unchanged;
    }

    let previous = session.step() - 1;
    session.set_step(previous);
    let notice = match session.category() {
        Some(category) => step_notice(category, previous),
        None => format!("step {previous}"),
    };
    Reduction::SteppedBack {
        to: previous,
        notice,
    }
}

pub(crate) fn step_notice(category: ApplicantCategory, step: u8) -> String {
    format!(
        "step {step} of {}: {}",
        category.max_steps(),
        category.step_title(step)
    )
}

fn changed(applied: bool) -> Reduction {
    if applied {
        Reduction::Updated
    } else {
        Reduction::Unchanged
    }
}
