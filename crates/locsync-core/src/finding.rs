use serde::{Deserialize, Serialize};

/// How loud a finding should be surfaced. Findings never block saving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Minor,
    Major,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FindingKind {
    PlaceholderMismatch,
    LineCountMismatch,
    BoundaryMismatch,
    LengthAnomaly,
    CapitalizationMismatch,
    RepeatedWord,
}

impl FindingKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FindingKind::PlaceholderMismatch => "placeholder-mismatch",
            FindingKind::LineCountMismatch => "line-count-mismatch",
            FindingKind::BoundaryMismatch => "boundary-mismatch",
            FindingKind::LengthAnomaly => "length-anomaly",
            FindingKind::CapitalizationMismatch => "capitalization-mismatch",
            FindingKind::RepeatedWord => "repeated-word",
        }
    }
}

/// One advisory validation result for a (source, translation) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub severity: Severity,
    pub message: String,
}

impl Finding {
    pub fn major(kind: FindingKind, message: impl Into<String>) -> Self {
        Finding {
            kind,
            severity: Severity::Major,
            message: message.into(),
        }
    }

    pub fn minor(kind: FindingKind, message: impl Into<String>) -> Self {
        Finding {
            kind,
            severity: Severity::Minor,
            message: message.into(),
        }
    }
}
