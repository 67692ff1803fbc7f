use serde::Serialize;

use crate::registration::{RegistrationForm, VisitDuration, VisitPurpose};
use crate::wizard::ValidationError;

/// Body of the create-visitor-request call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub phone_no: String,
    pub full_name: String,
    pub company_name: String,
    pub govt_id: String,
    pub purpose_of_visit: VisitPurpose,
    pub person_to_meet: String,
    pub department: String,
    pub visit_duration: VisitDuration,
}

impl RegistrationRequest {
    pub fn from_form(form: &RegistrationForm) -> Result<Self, ValidationError> {
        let purpose = form
            .purpose()
            .ok_or_else(|| incomplete("purpose of visit"))?;
        let visit_duration = form
            .visit_duration()
            .ok_or_else(|| incomplete("visit duration"))?;
        if !form.has_details() {
            return Err(incomplete("visitor details"));
        }
        if !form.has_meeting() {
            return Err(incomplete("meeting details"));
        }

        Ok(Self {
            phone_no: form.phone().trim().to_string(),
            full_name: form.full_name().trim().to_string(),
            company_name: form.company().trim().to_string(),
            govt_id: form.government_id().trim().to_string(),
            purpose_of_visit: purpose,
            person_to_meet: form.person_to_meet().trim().to_string(),
            department: form.department().trim().to_string(),
            visit_duration,
        })
    }
}

fn incomplete(field: &str) -> ValidationError {
    ValidationError::IncompleteForm {
        field: field.to_string(),
    }
}
