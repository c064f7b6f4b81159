use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

/// How one reconciled pair was matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Fuzzy,
    None,
}

/// Transient pairing of an old identity with a new identity. Either side may
/// be absent (unmatched-old / unmatched-new).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReconcileMatch {
    pub old_identity: Option<String>,
    pub new_identity: Option<String>,
    pub kind: MatchKind,
    /// Source-text similarity of the pairing; 1.0 for exact matches, 0.0
    /// for unmatched.
    pub confidence: f64,
}

/// Audit event recorded when a fuzzy match's top-two candidate scores are
/// within a negligible margin. The deterministic tie-break still applied.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AmbiguityEvent {
    pub new_identity: String,
    pub chosen_old_identity: String,
    pub runner_up_old_identity: String,
    pub chosen_score: f64,
    pub runner_up_score: f64,
}

/// What happened to unmatched old entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RemovedPolicy {
    /// Drop removed entries from the store.
    #[default]
    Drop,
    /// Keep removed entries, tagged ignored, for audit/history.
    KeepIgnored,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReconcileSummary {
    pub schema_version: u32,
    pub exact: usize,
    pub fuzzy: usize,
    pub added: usize,
    pub removed: usize,
    pub removed_policy: RemovedPolicy,
    pub ambiguities: usize,
}

/// One translation-memory suggestion for a query string.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Suggestion {
    pub source_text: String,
    pub translated_text: String,
    /// 1.0 for normalized-exact matches.
    pub score: f64,
    pub exact: bool,
}

/// Validation finding in wire shape, addressed to an entry.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FindingMsg {
    pub schema_version: u32,
    pub identity: String,
    pub kind: String,
    pub severity: String,
    pub message: String,
}

/// Per-entry outcome of a batch AI translation run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BatchItemOutcome {
    pub identity: String,
    pub status: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BatchSummary {
    pub schema_version: u32,
    pub translated: usize,
    pub failed: usize,
    pub skipped: usize,
    pub cancelled: bool,
    pub items: Vec<BatchItemOutcome>,
}

/// Translation-state counts over a whole store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct StoreStats {
    pub total: usize,
    pub untranslated: usize,
    pub translated: usize,
    pub fuzzy: usize,
    pub reviewed: usize,
    pub ignored: usize,
    pub with_warnings: usize,
}
