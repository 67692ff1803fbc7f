use serde::Serialize;

use crate::registration::{CapturedPhoto, SelfieUploadResult, VisitDuration, VisitPurpose};

/// Registration form owned by one wizard session.
///
/// Updates are by value: every `with_*` consumes the form and returns the new
/// one. Photo replacement drops any selfie identity bound to the old photo.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RegistrationForm {
    phone: String,
    otp_code: String,
    verified: bool,
    terms_accepted: bool,
    purpose: Option<VisitPurpose>,
    full_name: String,
    company: String,
    government_id: String,
    person_to_meet: String,
    department: String,
    visit_duration: Option<VisitDuration>,
    photo: Option<CapturedPhoto>,
    selfie: Option<SelfieUploadResult>,
}

impl RegistrationForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_phone(self, phone: impl Into<String>) -> Self {
        Self {
            phone: phone.into(),
            ..self
        }
    }

    pub fn with_otp_code(self, code: impl Into<String>) -> Self {
        Self {
            otp_code: code.into(),
            ..self
        }
    }

    /// Marks the phone verified and clears the entered code.
    pub fn mark_verified(self) -> Self {
        Self {
            verified: true,
            otp_code: String::new(),
            ..self
        }
    }

    pub fn with_terms_accepted(self, accepted: bool) -> Self {
        Self {
            terms_accepted: accepted,
            ..self
        }
    }

    pub fn with_purpose(self, purpose: VisitPurpose) -> Self {
        Self {
            purpose: Some(purpose),
            ..self
        }
    }

    pub fn with_details(
        self,
        full_name: impl Into<String>,
        company: impl Into<String>,
        government_id: impl Into<String>,
    ) -> Self {
        Self {
            full_name: full_name.into(),
            company: company.into(),
            government_id: government_id.into(),
            ..self
        }
    }

    pub fn with_meeting(
        self,
        person_to_meet: impl Into<String>,
        department: impl Into<String>,
        visit_duration: Option<VisitDuration>,
    ) -> Self {
        Self {
            person_to_meet: person_to_meet.into(),
            department: department.into(),
            visit_duration,
            ..self
        }
    }

    /// Replaces the photo. Any uploaded selfie identity is discarded.
    pub fn with_photo(self, photo: CapturedPhoto) -> Self {
        Self {
            photo: Some(photo),
            selfie: None,
            ..self
        }
    }

    /// Clears the photo and the selfie identity bound to it.
    pub fn without_photo(self) -> Self {
        Self {
            photo: None,
            selfie: None,
            ..self
        }
    }

    /// Attaches an upload result. Ignored unless it belongs to the current photo.
    pub fn with_selfie(self, selfie: SelfieUploadResult) -> Self {
        let matches_photo = self
            .photo
            .as_ref()
            .is_some_and(|photo| photo.id() == &selfie.photo_id);
        if !matches_photo {
            return self;
        }
        Self {
            selfie: Some(selfie),
            ..self
        }
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn otp_code(&self) -> &str {
        &self.otp_code
    }

    pub fn is_verified(&self) -> bool {
        self.verified
    }

    pub fn terms_accepted(&self) -> bool {
        self.terms_accepted
    }

    pub fn purpose(&self) -> Option<VisitPurpose> {
        self.purpose
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn company(&self) -> &str {
        &self.company
    }

    pub fn government_id(&self) -> &str {
        &self.government_id
    }

    pub fn person_to_meet(&self) -> &str {
        &self.person_to_meet
    }

    pub fn department(&self) -> &str {
        &self.department
    }

    pub fn visit_duration(&self) -> Option<VisitDuration> {
        self.visit_duration
    }

    pub fn photo(&self) -> Option<&CapturedPhoto> {
        self.photo.as_ref()
    }

    pub fn selfie(&self) -> Option<&SelfieUploadResult> {
        self.selfie.as_ref()
    }

    pub fn has_details(&self) -> bool {
        !is_blank(&self.full_name) && !is_blank(&self.company) && !is_blank(&self.government_id)
    }

    pub fn has_meeting(&self) -> bool {
        !is_blank(&self.person_to_meet)
            && !is_blank(&self.department)
            && self.visit_duration.is_some()
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
