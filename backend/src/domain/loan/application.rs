//! Applicant submission validation.
//!
//! Every field is checked and every violation is reported, so applicants
//! can fix their form in one round trip.

use serde::Deserialize;

use super::{EmploymentStatus, LoanDocument};
use crate::domain::{EmailAddress, FieldViolation, PersonName};

/// Smallest amount that may be requested.
pub const AMOUNT_MIN: f64 = 1_000.0;
/// Largest amount that may be requested.
pub const AMOUNT_MAX: f64 = 10_000_000.0;
/// Lowest valid credit score.
pub const CREDIT_SCORE_MIN: i64 = 300;
/// Highest valid credit score.
pub const CREDIT_SCORE_MAX: i64 = 850;
/// Longest accepted purpose text.
pub const PURPOSE_MAX: usize = 500;
/// Most documents accepted per application.
pub const DOCUMENTS_MAX: usize = 10;

const PHONE_MIN: usize = 7;
const PHONE_MAX: usize = 20;

/// A submitted value that either has the expected JSON type or is kept
/// verbatim so the mismatch can be reported alongside other violations.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FormField<T> {
    /// Value of the expected type.
    Valid(T),
    /// Any other JSON value.
    Invalid(serde_json::Value),
}

impl<T> From<T> for FormField<T> {
    fn from(value: T) -> Self {
        Self::Valid(value)
    }
}

/// Raw applicant input, as received from the client.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationForm {
    /// Applicant's full name.
    pub applicant_name: Option<FormField<String>>,
    /// Applicant's email.
    pub email: Option<FormField<String>>,
    /// Applicant's phone number.
    pub phone: Option<FormField<String>>,
    /// Requested amount.
    pub amount: Option<FormField<f64>>,
    /// Stated purpose.
    pub purpose: Option<FormField<String>>,
    /// Employment status keyword.
    pub employment_status: Option<FormField<String>>,
    /// Monthly income.
    pub monthly_income: Option<FormField<f64>>,
    /// Optional credit score.
    pub credit_score: Option<FormField<i64>>,
    /// Optional supporting documents.
    pub documents: Option<FormField<Vec<DocumentForm>>>,
}

/// Raw document reference.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DocumentForm {
    /// Display name.
    pub name: Option<FormField<String>>,
    /// Location.
    pub url: Option<FormField<String>>,
}

/// Validated application ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct LoanApplication {
    /// Applicant's full name.
    pub applicant_name: PersonName,
    /// Applicant's normalised email.
    pub email: EmailAddress,
    /// Trimmed phone number.
    pub phone: String,
    /// Requested amount.
    pub amount: f64,
    /// Trimmed purpose.
    pub purpose: String,
    /// Employment status.
    pub employment_status: EmploymentStatus,
    /// Monthly income.
    pub monthly_income: f64,
    /// Optional credit score.
    pub credit_score: Option<u16>,
    /// Supporting documents.
    pub documents: Vec<LoanDocument>,
}

#[derive(Default)]
struct Violations(Vec<FieldViolation>);

impl Violations {
    fn push(&mut self, field: &str, code: &str, message: impl Into<String>) {
        self.0.push(FieldViolation::new(field, code, message));
    }

    fn required(&mut self, field: &str) {
        self.push(field, "required", format!("{field} is required"));
    }

    /// Unwrap `field`, recording a type mismatch under `name`.
    fn typed<T>(&mut self, name: &str, expected: &str, field: Option<FormField<T>>) -> Input<T> {
        match field {
            None => Input::Missing,
            Some(FormField::Valid(value)) => Input::Present(value),
            Some(FormField::Invalid(_)) => {
                self.push(name, "invalid_type", format!("{name} must be {expected}"));
                Input::Invalid
            }
        }
    }
}

/// A form field after its JSON type has been checked.
enum Input<T> {
    Missing,
    Invalid,
    Present(T),
}

const A_STRING: &str = "a string";
const A_NUMBER: &str = "a number";

impl LoanApplication {
    /// Validate `form`, reporting every violated field.
    ///
    /// # Examples
    /// ```
    /// use loan_backend::domain::loan::{ApplicationForm, LoanApplication};
    ///
    /// let form = ApplicationForm {
    ///     amount: Some(10.0.into()),
    ///     credit_score: Some(900.into()),
    ///     ..ApplicationForm::default()
    /// };
    /// let violations = LoanApplication::validate(form).unwrap_err();
    /// assert!(violations.iter().any(|v| v.field == "amount"));
    /// assert!(violations.iter().any(|v| v.field == "creditScore"));
    /// assert!(violations.iter().any(|v| v.field == "email"));
    /// ```
    pub fn validate(form: ApplicationForm) -> Result<Self, Vec<FieldViolation>> {
        let mut violations = Violations::default();

        let applicant_name =
            match violations.typed("applicantName", A_STRING, form.applicant_name) {
                Input::Missing => {
                    violations.required("applicantName");
                    None
                }
                Input::Invalid => None,
                Input::Present(raw) => match PersonName::new(&raw) {
                    Ok(name) => Some(name),
                    Err(err) => {
                        violations.push("applicantName", err.code(), err.to_string());
                        None
                    }
                },
            };

        let email = match violations.typed("email", A_STRING, form.email) {
            Input::Missing => {
                violations.required("email");
                None
            }
            Input::Invalid => None,
            Input::Present(raw) => match EmailAddress::new(&raw) {
                Ok(email) => Some(email),
                Err(err) => {
                    violations.push("email", err.code(), err.to_string());
                    None
                }
            },
        };

        let phone = match violations.typed("phone", A_STRING, form.phone) {
            Input::Missing => {
                violations.required("phone");
                None
            }
            Input::Invalid => None,
            Input::Present(raw) => validate_phone(&raw, &mut violations),
        };

        let amount = match violations.typed("amount", A_NUMBER, form.amount) {
            Input::Missing => {
                violations.required("amount");
                None
            }
            Input::Invalid => None,
            Input::Present(value) => validate_amount(value, &mut violations),
        };

        let purpose = match violations.typed("purpose", A_STRING, form.purpose) {
            Input::Missing => {
                violations.required("purpose");
                None
            }
            Input::Invalid => None,
            Input::Present(raw) => validate_purpose(&raw, &mut violations),
        };

        let employment_status =
            match violations.typed("employmentStatus", A_STRING, form.employment_status) {
                Input::Missing => {
                    violations.required("employmentStatus");
                    None
                }
                Input::Invalid => None,
                Input::Present(raw) => match raw.trim().parse::<EmploymentStatus>() {
                    Ok(status) => Some(status),
                    Err(err) => {
                        violations.push("employmentStatus", "invalid_value", err.to_string());
                        None
                    }
                },
            };

        let monthly_income = match violations.typed("monthlyIncome", A_NUMBER, form.monthly_income)
        {
            Input::Missing => {
                violations.required("monthlyIncome");
                None
            }
            Input::Invalid => None,
            Input::Present(income) if income.is_finite() && income >= 0.0 => Some(income),
            Input::Present(_) => {
                violations.push(
                    "monthlyIncome",
                    "out_of_range",
                    "monthlyIncome must be zero or greater",
                );
                None
            }
        };

        let credit_score =
            match violations.typed("creditScore", "a whole number", form.credit_score) {
                Input::Missing | Input::Invalid => None,
                Input::Present(score) => validate_credit_score(score, &mut violations),
            };

        let documents = match violations.typed("documents", "a list", form.documents) {
            Input::Missing | Input::Invalid => Vec::new(),
            Input::Present(documents) => validate_documents(documents, &mut violations),
        };

        match (
            applicant_name,
            email,
            phone,
            amount,
            purpose,
            employment_status,
            monthly_income,
        ) {
            (
                Some(applicant_name),
                Some(email),
                Some(phone),
                Some(amount),
                Some(purpose),
                Some(employment_status),
                Some(monthly_income),
            ) if violations.0.is_empty() => Ok(Self {
                applicant_name,
                email,
                phone,
                amount,
                purpose,
                employment_status,
                monthly_income,
                credit_score,
                documents,
            }),
            _ => Err(violations.0),
        }
    }
}

fn validate_phone(raw: &str, violations: &mut Violations) -> Option<String> {
    let phone = raw.trim();
    if phone.is_empty() {
        violations.required("phone");
        return None;
    }
    let length = phone.chars().count();
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')'));
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    if !(PHONE_MIN..=PHONE_MAX).contains(&length) || !allowed || digits < PHONE_MIN {
        violations.push(
            "phone",
            "invalid_format",
            format!(
                "phone must be {PHONE_MIN}-{PHONE_MAX} characters of digits, spaces, +, -, ( or )"
            ),
        );
        return None;
    }
    Some(phone.to_owned())
}

fn validate_amount(value: f64, violations: &mut Violations) -> Option<f64> {
    if (AMOUNT_MIN..=AMOUNT_MAX).contains(&value) {
        return Some(value);
    }
    violations.push(
        "amount",
        "out_of_range",
        format!("amount must be between {AMOUNT_MIN} and {AMOUNT_MAX}"),
    );
    None
}

fn validate_purpose(raw: &str, violations: &mut Violations) -> Option<String> {
    let purpose = raw.trim();
    if purpose.is_empty() {
        violations.required("purpose");
        return None;
    }
    if purpose.chars().count() > PURPOSE_MAX {
        violations.push(
            "purpose",
            "too_long",
            format!("purpose must be at most {PURPOSE_MAX} characters"),
        );
        return None;
    }
    Some(purpose.to_owned())
}

fn validate_credit_score(value: i64, violations: &mut Violations) -> Option<u16> {
    if !(CREDIT_SCORE_MIN..=CREDIT_SCORE_MAX).contains(&value) {
        violations.push(
            "creditScore",
            "out_of_range",
            format!("creditScore must be between {CREDIT_SCORE_MIN} and {CREDIT_SCORE_MAX}"),
        );
        return None;
    }
    u16::try_from(value).ok()
}

fn validate_documents(
    documents: Vec<DocumentForm>,
    violations: &mut Violations,
) -> Vec<LoanDocument> {
    if documents.len() > DOCUMENTS_MAX {
        violations.push(
            "documents",
            "too_many",
            format!("at most {DOCUMENTS_MAX} documents may be attached"),
        );
        return Vec::new();
    }
    let mut accepted = Vec::with_capacity(documents.len());
    for (index, document) in documents.into_iter().enumerate() {
        let mut text = |part: &str, field: Option<FormField<String>>| {
            let name = format!("documents[{index}].{part}");
            match violations.typed(&name, A_STRING, field) {
                Input::Present(raw) if !raw.trim().is_empty() => Some(raw.trim().to_owned()),
                Input::Invalid => None,
                Input::Missing | Input::Present(_) => {
                    violations.required(&name);
                    None
                }
            }
        };
        let name = text("name", document.name);
        let url = text("url", document.url);
        if let (Some(name), Some(url)) = (name, url) {
            accepted.push(LoanDocument { name, url });
        }
    }
    accepted
}
