use std::fmt;

use serde::{Deserialize, Serialize};

/// CommitRights is the legacy committership permission bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitRights(u32);

impl CommitRights {
    pub const REVIEW: CommitRights = CommitRights(1 << 0); // 1
    pub const COMMIT: CommitRights = CommitRights(1 << 1); // 2
    pub const ADMIN: CommitRights = CommitRights(1 << 2); // 4

    pub const fn new(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns true if this bitmask contains the required right.
    #[must_use]
    pub const fn has(self, required: CommitRights) -> bool {
        self.0 & required.0 == required.0
    }

    #[must_use]
    pub const fn union(self, other: CommitRights) -> CommitRights {
        CommitRights(self.0 | other.0)
    }

    /// A committer is anyone allowed to write to the repository.
    #[must_use]
    pub const fn can_push(self) -> bool {
        self.has(Self::COMMIT) || self.has(Self::ADMIN)
    }

    #[must_use]
    pub fn to_strings(self) -> Vec<&'static str> {
        let mut rights = Vec::new();
        if self.has(Self::REVIEW) {
            rights.push("review");
        }
        if self.has(Self::COMMIT) {
            rights.push("commit");
        }
        if self.has(Self::ADMIN) {
            rights.push("admin");
        }
        rights
    }
}

impl fmt::Display for CommitRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_strings().join(", "))
    }
}

/// Out-of-range column values grant nothing.
impl From<i64> for CommitRights {
    fn from(bits: i64) -> Self {
        Self(u32::try_from(bits).unwrap_or_default())
    }
}

/// Target platform membership level, serialized as its numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum AccessLevel {
    Guest,
    Reporter,
    Developer,
    Maintainer,
    Owner,
}

impl AccessLevel {
    #[must_use]
    pub const fn value(self) -> u32 {
        match self {
            Self::Guest => 10,
            Self::Reporter => 20,
            Self::Developer => 30,
            Self::Maintainer => 40,
            Self::Owner => 50,
        }
    }
}

impl From<AccessLevel> for u32 {
    fn from(level: AccessLevel) -> Self {
        level.value()
    }
}

impl TryFrom<u32> for AccessLevel {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            10 => Ok(Self::Guest),
            20 => Ok(Self::Reporter),
            30 => Ok(Self::Developer),
            40 => Ok(Self::Maintainer),
            50 => Ok(Self::Owner),
            // Minimal access (5) and unknown levels sit below guest.
            other if other < 10 => Ok(Self::Guest),
            other => Err(format!("unknown access level: {other}")),
        }
    }
}
