//! Stage mode and backend enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The execution policy of a stage.
///
/// Unrecognized mode strings are preserved in [`StageMode::Unknown`] rather
/// than rejected; the executor treats such stages as no-ops.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StageMode {
    /// Run every ability in order.
    #[default]
    Deterministic,
    /// Run every ability in order when the stage condition holds.
    Conditional,
    /// Fixed evaluation / escalation / update policy.
    NonDeterministic,
    /// A mode string this engine does not know.
    Unknown(String),
}

impl StageMode {
    /// Returns the canonical string for the mode.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Deterministic => "deterministic",
            Self::Conditional => "conditional",
            Self::NonDeterministic => "non_deterministic",
            Self::Unknown(raw) => raw,
        }
    }

    /// Returns true if the mode is one the executor understands.
    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl From<String> for StageMode {
    fn from(raw: String) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "deterministic" => Self::Deterministic,
            "conditional" => Self::Conditional,
            "non_deterministic" | "non-deterministic" => Self::NonDeterministic,
            _ => Self::Unknown(raw),
        }
    }
}

impl From<&str> for StageMode {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<StageMode> for String {
    fn from(mode: StageMode) -> Self {
        mode.as_str().to_string()
    }
}

impl fmt::Display for StageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The dispatch namespace an ability is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum Backend {
    /// Locally implemented abilities.
    Common,
    /// Abilities nominally served by the remote ATLAS namespace.
    Atlas,
}

impl Backend {
    /// All backends, in declaration order.
    pub const ALL: [Self; 2] = [Self::Common, Self::Atlas];

    /// Returns the lower-case tag used in simulated results.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Atlas => "atlas",
        }
    }
}

impl TryFrom<String> for Backend {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        match raw.trim().to_uppercase().as_str() {
            "COMMON" => Ok(Self::Common),
            "ATLAS" => Ok(Self::Atlas),
            _ => Err(format!("unknown backend '{raw}', expected COMMON or ATLAS")),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Common => write!(f, "COMMON"),
            Self::Atlas => write!(f, "ATLAS"),
        }
    }
}
