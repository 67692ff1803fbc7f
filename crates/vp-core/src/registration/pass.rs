use std::fmt;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ids::VisitorId;
use crate::registration::{
    RegistrationForm, SelfieUploadResult, VisitDuration, VisitPurpose,
};
use crate::wizard::ValidationError;

/// Client-generated pass number, `VP-` followed by six digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PassNumber(String);

impl PassNumber {
    pub const PREFIX: &'static str = "VP-";
    const DIGITS: usize = 6;

    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        let value: u32 = rng.random_range(0..1_000_000);
        Self(format!("{}{:06}", Self::PREFIX, value))
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let digits = raw.strip_prefix(Self::PREFIX)?;
        (digits.len() == Self::DIGITS && digits.bytes().all(|b| b.is_ascii_digit()))
            .then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PassNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pass metadata returned by the pass-generation call.
///
/// Unknown fields are kept verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassDetails {
    #[serde(default, alias = "_id")]
    pub pass_id: Option<String>,
    #[serde(default)]
    pub valid_from: Option<String>,
    #[serde(default, alias = "validTill")]
    pub valid_until: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub qr_code: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Read-only pass issued once registration and pass generation both succeeded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitorPass {
    pub pass_number: PassNumber,
    pub visitor_id: VisitorId,
    pub selfie_url: String,
    pub full_name: String,
    pub company: String,
    pub phone: String,
    pub purpose: VisitPurpose,
    pub person_to_meet: String,
    pub department: String,
    pub visit_duration: VisitDuration,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub issued_at: DateTime<Utc>,
    pub details: PassDetails,
}

impl VisitorPass {
    /// Combines the form, the selfie identity and the server metadata.
    ///
    /// A validity window the server omitted (or sent unparseable) is derived
    /// from `issued_at` and the visit duration.
    pub fn assemble(
        form: &RegistrationForm,
        selfie: &SelfieUploadResult,
        details: PassDetails,
        pass_number: PassNumber,
        issued_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let purpose = form.purpose().ok_or_else(|| ValidationError::IncompleteForm {
            field: "purpose of visit".to_string(),
        })?;
        let visit_duration = form
            .visit_duration()
            .ok_or_else(|| ValidationError::IncompleteForm {
                field: "visit duration".to_string(),
            })?;

        let valid_from = details
            .valid_from
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or(issued_at);
        let valid_until = details
            .valid_until
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or_else(|| valid_from + Duration::hours(i64::from(visit_duration.hours())));

        Ok(Self {
            pass_number,
            visitor_id: selfie.visitor_id.clone(),
            selfie_url: selfie.selfie_url.clone(),
            full_name: form.full_name().trim().to_string(),
            company: form.company().trim().to_string(),
            phone: form.phone().trim().to_string(),
            purpose,
            person_to_meet: form.person_to_meet().trim().to_string(),
            department: form.department().trim().to_string(),
            visit_duration,
            valid_from,
            valid_until,
            issued_at,
            details,
        })
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}
