use serde::{Deserialize, Serialize};

/// Wizard step, in display order.
///
/// 向导步骤（按顺序）。
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    #[default]
    Verification,
    Photo,
    Purpose,
    Details,
    Meeting,
    Review,
}

impl WizardStep {
    pub const ALL: [WizardStep; 6] = [
        Self::Verification,
        Self::Photo,
        Self::Purpose,
        Self::Details,
        Self::Meeting,
        Self::Review,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    pub fn previous(self) -> Option<Self> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }
}
