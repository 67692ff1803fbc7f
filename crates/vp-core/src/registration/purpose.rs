use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::wizard::ValidationError;

/// Purpose of the visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisitPurpose {
    Business,
    Interview,
    Meeting,
    Delivery,
    Maintenance,
    Personal,
    Other,
}

impl VisitPurpose {
    pub const ALL: [VisitPurpose; 7] = [
        Self::Business,
        Self::Interview,
        Self::Meeting,
        Self::Delivery,
        Self::Maintenance,
        Self::Personal,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Business => "business",
            Self::Interview => "interview",
            Self::Meeting => "meeting",
            Self::Delivery => "delivery",
            Self::Maintenance => "maintenance",
            Self::Personal => "personal",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for VisitPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VisitPurpose {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|purpose| purpose.as_str() == needle)
            .ok_or_else(|| ValidationError::InvalidPurpose(s.to_string()))
    }
}

/// Visit duration in whole hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct VisitDuration(u8);

impl VisitDuration {
    pub const MAX_HOURS: u8 = 24;

    pub fn from_hours(hours: u8) -> Result<Self, ValidationError> {
        if (1..=Self::MAX_HOURS).contains(&hours) {
            Ok(Self(hours))
        } else {
            Err(ValidationError::InvalidDuration(hours.to_string()))
        }
    }

    pub fn hours(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for VisitDuration {
    type Error = ValidationError;

    fn try_from(hours: u8) -> Result<Self, Self::Error> {
        Self::from_hours(hours)
    }
}

impl From<VisitDuration> for u8 {
    fn from(duration: VisitDuration) -> Self {
        duration.0
    }
}

impl FromStr for VisitDuration {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .map_err(|_| ValidationError::InvalidDuration(s.to_string()))
            .and_then(Self::from_hours)
    }
}

impl fmt::Display for VisitDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purpose_parses_case_insensitively() {
        assert_eq!("business".parse::<VisitPurpose>(), Ok(VisitPurpose::Business));
        assert_eq!(" Delivery ".parse::<VisitPurpose>(), Ok(VisitPurpose::Delivery));
        assert!("sightseeing".parse::<VisitPurpose>().is_err());
    }

    #[test]
    fn duration_accepts_one_to_twenty_four_hours() {
        assert_eq!("1".parse::<VisitDuration>().unwrap().hours(), 1);
        assert_eq!("24".parse::<VisitDuration>().unwrap().hours(), 24);
        assert!("0".parse::<VisitDuration>().is_err());
        assert!("25".parse::<VisitDuration>().is_err());
        assert!("1.5".parse::<VisitDuration>().is_err());
    }
}
