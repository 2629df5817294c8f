use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Upper bound for each uploaded document.
pub const MAX_DOCUMENT_BYTES: u64 = 5 * 1024 * 1024;

/// Applicant type selected from the entry link; fixed for the session once set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicantCategory {
    Agency,
    Freelancer,
}

impl ApplicantCategory {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Agency => "agency",
            Self::Freelancer => "freelancer",
        }
    }

    /// Total step count for the category, confirmation included.
    pub const fn max_steps(self) -> u8 {
        match self {
            Self::Agency => 4,
            Self::Freelancer => 3,
        }
    }

    /// The confirmation step reached after a successful submission.
    pub const fn terminal_step(self) -> u8 {
        self.max_steps()
    }

    /// The document-collection step exists only for agencies.
    pub const fn document_step(self) -> Option<u8> {
        match self {
            Self::Agency => Some(3),
            Self::Freelancer => None,
        }
    }

    pub const fn step_title(self, step: u8) -> &'static str {
        match (self, step) {
            (_, 1) => "Profile",
            (_, 2) => "Questionnaire",
            (Self::Agency, 3) => "Documents",
            _ => "Confirmation",
        }
    }

    /// Accepts the singular and plural spellings used in entry links, any case.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "agency" | "agencies" => Some(Self::Agency),
            "freelancer" | "freelancers" => Some(Self::Freelancer),
            _ => None,
        }
    }
}

/// Raw entry-link parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EntryParams {
    pub opening: Option<String>,
    pub job_type: Option<String>,
}

/// Normalized entry context, with any parse warnings to surface to the applicant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryContext {
    pub opening: String,
    pub category: Option<ApplicantCategory>,
    pub warnings: Vec<String>,
}

impl EntryContext {
    pub fn resolve(params: &EntryParams) -> Self {
        let opening = params.opening.clone().unwrap_or_default();
        let mut warnings = Vec::new();

        let category = match params.job_type.as_deref() {
            None => None,
            Some(raw) => match ApplicantCategory::parse(raw) {
                Some(category) => Some(category),
                None => {
                    warnings.push(format!(
                        "unrecognized job_type '{}'; pick agency or freelancer to continue",
                        raw.trim()
                    ));
                    None
                }
            },
        };

        Self {
            opening,
            category,
            warnings,
        }
    }
}

/// Field identifiers across both category schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    AgencyName,
    ContactName,
    FullName,
    ContactEmail,
    Phone,
    Website,
    PortfolioUrl,
}

impl ProfileField {
    pub const fn name(self) -> &'static str {
        match self {
            Self::AgencyName => "agency_name",
            Self::ContactName => "contact_name",
            Self::FullName => "full_name",
            Self::ContactEmail => "contact_email",
            Self::Phone => "phone",
            Self::Website => "website",
            Self::PortfolioUrl => "portfolio_url",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "agency_name" => Some(Self::AgencyName),
            "contact_name" => Some(Self::ContactName),
            "full_name" => Some(Self::FullName),
            "contact_email" => Some(Self::ContactEmail),
            "phone" => Some(Self::Phone),
            "website" => Some(Self::Website),
            "portfolio_url" => Some(Self::PortfolioUrl),
            _ => None,
        }
    }
}

/// Required document slots for the agency document step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    CompanyRegistration,
    InsuranceCertificate,
    TaxClearance,
    PortfolioDeck,
}

impl DocumentKind {
    pub const fn required() -> [Self; 4] {
        [
            Self::CompanyRegistration,
            Self::InsuranceCertificate,
            Self::TaxClearance,
            Self::PortfolioDeck,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::CompanyRegistration => "company_registration",
            Self::InsuranceCertificate => "insurance_certificate",
            Self::TaxClearance => "tax_clearance",
            Self::PortfolioDeck => "portfolio_deck",
        }
    }
}

/// Metadata for an attached document. Attachments never survive a reload, so
/// they are excluded from snapshots and must be re-attached after a resume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentAttachment {
    pub file_name: String,
    pub size_bytes: u64,
}

impl DocumentAttachment {
    pub fn within_limit(&self) -> bool {
        self.size_bytes <= MAX_DOCUMENT_BYTES
    }
}

/// Agency contact schema. Empty string is the "unset" sentinel for every
/// string field; `Option` is reserved for the file attachments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgencyProfile {
    #[serde(default)]
    pub agency_name: String,
    #[serde(default)]
    pub contact_name: String,
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub website: String,
    #[serde(skip)]
    pub documents: BTreeMap<DocumentKind, DocumentAttachment>,
}

/// Freelancer contact schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FreelancerProfile {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub portfolio_url: String,
}

/// Category-tagged profile so every field has a declared type and default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryProfile {
    Agency(AgencyProfile),
    Freelancer(FreelancerProfile),
}

impl CategoryProfile {
    pub fn empty(category: ApplicantCategory) -> Self {
        match category {
            ApplicantCategory::Agency => Self::Agency(AgencyProfile::default()),
            ApplicantCategory::Freelancer => Self::Freelancer(FreelancerProfile::default()),
        }
    }

    pub fn category(&self) -> ApplicantCategory {
        match self {
            Self::Agency(_) => ApplicantCategory::Agency,
            Self::Freelancer(_) => ApplicantCategory::Freelancer,
        }
    }

    /// Merge one field. Fields foreign to the active schema are dropped.
    pub fn set_field(&mut self, field: ProfileField, value: String) -> bool {
        match self {
            Self::Agency(profile) => {
                let slot = match field {
                    ProfileField::AgencyName => &mut profile.agency_name,
                    ProfileField::ContactName => &mut profile.contact_name,
                    ProfileField::ContactEmail => &mut profile.contact_email,
                    ProfileField::Phone => &mut profile.phone,
                    ProfileField::Website => &mut profile.website,
                    _ => return false,
                };
                *slot = value;
                true
            }
            Self::Freelancer(profile) => {
                let slot = match field {
                    ProfileField::FullName => &mut profile.full_name,
                    ProfileField::ContactEmail => &mut profile.contact_email,
                    ProfileField::Phone => &mut profile.phone,
                    ProfileField::PortfolioUrl => &mut profile.portfolio_url,
                    _ => return false,
                };
                *slot = value;
                true
            }
        }
    }

    pub fn field(&self, field: ProfileField) -> Option<&str> {
        let value = match self {
            Self::Agency(profile) => match field {
                ProfileField::AgencyName => &profile.agency_name,
                ProfileField::ContactName => &profile.contact_name,
                ProfileField::ContactEmail => &profile.contact_email,
                ProfileField::Phone => &profile.phone,
                ProfileField::Website => &profile.website,
                _ => return None,
            },
            Self::Freelancer(profile) => match field {
                ProfileField::FullName => &profile.full_name,
                ProfileField::ContactEmail => &profile.contact_email,
                ProfileField::Phone => &profile.phone,
                ProfileField::PortfolioUrl => &profile.portfolio_url,
                _ => return None,
            },
        };
        Some(value.as_str())
    }

    /// All fields of the active schema, for snapshots and the outbound payload.
    pub fn fields(&self) -> BTreeMap<&'static str, String> {
        let mut map = BTreeMap::new();
        for field in self.schema() {
            if let Some(value) = self.field(*field) {
                map.insert(field.name(), value.to_string());
            }
        }
        map
    }

    /// Rebuild a profile from a persisted field map, coercing absent or null
    /// values back to the empty-string sentinel.
    pub fn from_saved(
        category: ApplicantCategory,
        fields: &BTreeMap<String, Option<String>>,
    ) -> Self {
        let mut profile = Self::empty(category);
        for (name, value) in fields {
            if let Some(field) = ProfileField::parse(name) {
                profile.set_field(field, value.clone().unwrap_or_default());
            }
        }
        profile
    }

    fn schema(&self) -> &'static [ProfileField] {
        match self {
            Self::Agency(_) => &[
                ProfileField::AgencyName,
                ProfileField::ContactName,
                ProfileField::ContactEmail,
                ProfileField::Phone,
                ProfileField::Website,
            ],
            Self::Freelancer(_) => &[
                ProfileField::FullName,
                ProfileField::ContactEmail,
                ProfileField::Phone,
                ProfileField::PortfolioUrl,
            ],
        }
    }

    fn required_fields(&self) -> &'static [ProfileField] {
        match self {
            Self::Agency(_) => &[
                ProfileField::AgencyName,
                ProfileField::ContactName,
                ProfileField::ContactEmail,
                ProfileField::Phone,
            ],
            Self::Freelancer(_) => &[
                ProfileField::FullName,
                ProfileField::ContactEmail,
                ProfileField::Phone,
            ],
        }
    }

    /// Per-field validation messages for the profile step. Empty map means the
    /// step may be passed.
    pub fn field_errors(&self) -> BTreeMap<&'static str, String> {
        let mut errors = BTreeMap::new();

        for field in self.required_fields() {
            let value = self.field(*field).unwrap_or_default();
            if value.trim().is_empty() {
                errors.insert(
                    field.name(),
                    format!("{} is required", field.name().replace('_', " ")),
                );
            }
        }

        let email = self.field(ProfileField::ContactEmail).unwrap_or_default();
        if !email.trim().is_empty() && !email_looks_valid(email) {
            errors.insert(
                ProfileField::ContactEmail.name(),
                "enter a valid email address".to_string(),
            );
        }

        errors
    }

    pub fn documents(&self) -> Option<&BTreeMap<DocumentKind, DocumentAttachment>> {
        match self {
            Self::Agency(profile) => Some(&profile.documents),
            Self::Freelancer(_) => None,
        }
    }
}

fn email_looks_valid(value: &str) -> bool {
    let Some((local, domain)) = value.trim().split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}
