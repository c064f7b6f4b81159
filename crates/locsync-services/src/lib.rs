//! Orchestration over the engine crates: source updates, batch validation,
//! translation-memory application, suggestion caching, write-back and
//! reporting. Every function here composes the pure engine crates and owns
//! no matching or validation logic of its own.

mod cancel;
mod project;
mod store;
mod translate;

pub use cancel::CancelToken;
pub use project::{load_project, save_project, ProjectFile};
pub use store::{DisplayOrder, EntryStore};
pub use translate::{translate_batch, Translator};

use locsync_core::{ExtractionError, Result, Status};
use locsync_domain::{
    AmbiguityEvent, FindingMsg, ReconcileSummary, StoreStats, Suggestion, SCHEMA_VERSION,
};
use locsync_extract::{extract, ExtractPolicy, ExtractionRule};
use locsync_reconcile::{reconcile, ReconcilePolicy};
use locsync_tm::{suggest, MatchPolicy, TmStore};
use locsync_validate::{validate, RatioBaselines, ValidatePolicy};
use lru::LruCache;
use std::io::Write;
use std::num::NonZeroUsize;

/// Result of one source refresh: the store already holds the new entry set.
#[derive(Debug)]
pub struct UpdateOutcome {
    pub summary: ReconcileSummary,
    pub ambiguities: Vec<AmbiguityEvent>,
    /// Rules whose pattern failed to compile during extraction.
    pub skipped_rules: Vec<ExtractionError>,
}

/// Re-extract from changed source text and reconcile against the store's
/// current entries. The store's contents are replaced wholesale; translation
/// state survives through the reconciler's carry rules.
pub fn update_from_source(
    store: &mut EntryStore,
    text: &str,
    rules: &[ExtractionRule],
    extract_policy: &ExtractPolicy,
    reconcile_policy: &ReconcilePolicy,
) -> UpdateOutcome {
    let extracted = extract(text, rules, extract_policy);
    let outcome = reconcile(store.entries(), extracted.entries, reconcile_policy);
    tracing::info!(
        event = "store_updated",
        exact = outcome.summary.exact,
        fuzzy = outcome.summary.fuzzy,
        added = outcome.summary.added,
        removed = outcome.summary.removed
    );
    store.replace_all(outcome.entries);
    UpdateOutcome {
        summary: outcome.summary,
        ambiguities: outcome.ambiguities,
        skipped_rules: extracted.skipped_rules,
    }
}

/// Refresh the store from a PO template or a translated PO file. Candidates
/// enter reconciliation translation-free so the store's own translation
/// state drives the carry rules; afterwards, incoming translations fill the
/// entries the store had nothing for. The store side always wins a conflict.
pub fn update_from_pot(
    store: &mut EntryStore,
    pot_path: &std::path::Path,
    reconcile_policy: &ReconcilePolicy,
) -> Result<UpdateOutcome> {
    let mut candidates = locsync_po::read_po_file(pot_path)?;
    let incoming: std::collections::HashMap<String, (String, Status)> = candidates
        .iter()
        .filter(|e| !e.translated_text.is_empty())
        .map(|e| (e.identity.clone(), (e.translated_text.clone(), e.status)))
        .collect();
    for entry in &mut candidates {
        entry.translated_text.clear();
        entry.status = Status::Untranslated;
    }
    let mut outcome = reconcile(store.entries(), candidates, reconcile_policy);
    for entry in &mut outcome.entries {
        if entry.translated_text.is_empty() && entry.status == Status::Untranslated {
            if let Some((text, status)) = incoming.get(&entry.identity) {
                entry.translated_text = text.clone();
                entry.status = *status;
            }
        }
    }
    tracing::info!(
        event = "store_updated_from_pot",
        path = %pot_path.display(),
        exact = outcome.summary.exact,
        fuzzy = outcome.summary.fuzzy
    );
    store.replace_all(outcome.entries);
    Ok(UpdateOutcome {
        summary: outcome.summary,
        ambiguities: outcome.ambiguities,
        skipped_rules: Vec::new(),
    })
}

fn severity_str(severity: locsync_core::Severity) -> &'static str {
    match severity {
        locsync_core::Severity::Minor => "minor",
        locsync_core::Severity::Major => "major",
    }
}

/// Recompute validator findings for every entry, in display order, and
/// refresh each entry's transient flags. Ignored entries and empty
/// translations produce no findings. Cancellation leaves flags recomputed
/// for the prefix already visited.
pub fn validate_all(
    store: &mut EntryStore,
    baselines: Option<&RatioBaselines>,
    source_lang: &str,
    target_lang: &str,
    policy: &ValidatePolicy,
    cancel: &CancelToken,
) -> Vec<FindingMsg> {
    let expected = baselines.and_then(|b| b.expected(source_lang, target_lang));
    let order: Vec<String> = store
        .display_entries(DisplayOrder::Position)
        .iter()
        .map(|e| e.identity.clone())
        .collect();

    let mut messages = Vec::new();
    for identity in order {
        if cancel.is_cancelled() {
            break;
        }
        let Some(entry) = store.get_mut(&identity) else {
            continue;
        };
        if entry.status == Status::Ignored {
            entry.flags.clear();
            continue;
        }
        entry.flags = validate(&entry.source_text, &entry.translated_text, expected, policy);
        for finding in &entry.flags {
            messages.push(FindingMsg {
                schema_version: SCHEMA_VERSION,
                identity: identity.clone(),
                kind: finding.kind.as_str().to_string(),
                severity: severity_str(finding.severity).to_string(),
                message: finding.message.clone(),
            });
        }
    }
    tracing::info!(event = "validated", findings = messages.len());
    messages
}

/// Fill untranslated entries from exact translation-memory hits. Existing
/// translations are never overwritten. Returns the number of entries filled.
pub fn apply_tm(store: &mut EntryStore, tm: &TmStore) -> usize {
    let identities: Vec<String> = store
        .iter()
        .filter(|e| e.status == Status::Untranslated && e.translated_text.is_empty())
        .map(|e| e.identity.clone())
        .collect();

    let mut filled = 0usize;
    for identity in identities {
        let Some(entry) = store.get(&identity) else {
            continue;
        };
        let Some(record) = tm.exact(&entry.source_text) else {
            continue;
        };
        let target = record.target_text.clone();
        store.update(&identity, |e| e.set_translation(target));
        filled += 1;
    }
    tracing::info!(event = "tm_applied", filled);
    filled
}

/// Memory Matcher front end with an LRU cache over recent queries. The cache
/// must be dropped or recreated whenever the backing store changes.
pub struct SuggestionEngine {
    policy: MatchPolicy,
    cache: LruCache<String, Vec<Suggestion>>,
}

impl SuggestionEngine {
    pub fn new(policy: MatchPolicy) -> Self {
        let cap = NonZeroUsize::new(256).unwrap_or(NonZeroUsize::MIN);
        SuggestionEngine {
            policy,
            cache: LruCache::new(cap),
        }
    }

    pub fn suggest(&mut self, query: &str, tm: &TmStore) -> Vec<Suggestion> {
        if let Some(hit) = self.cache.get(query) {
            return hit.clone();
        }
        let suggestions = suggest(query, tm, &self.policy);
        self.cache.put(query.to_string(), suggestions.clone());
        suggestions
    }

    pub fn invalidate(&mut self) {
        self.cache.clear();
    }
}

/// Splice translations back into the original source text. Entries with a
/// recorded byte span and a non-empty translation replace their payload with
/// the escaped translation; everything else is left byte-for-byte intact.
/// Spans are applied right to left so earlier offsets stay valid.
pub fn write_back(source: &str, store: &EntryStore) -> String {
    let mut spans: Vec<(usize, usize, String)> = store
        .iter()
        .filter(|e| e.status.expects_translation() && !e.translated_text.is_empty())
        .filter_map(|e| e.span.map(|(s, t)| (s, t, e.raw_translation())))
        .collect();
    spans.sort_by(|a, b| b.0.cmp(&a.0));

    let mut out = source.to_string();
    for (start, end, replacement) in spans {
        if out.get(start..end).is_none() {
            tracing::warn!(event = "write_back_span_stale", start, end);
            continue;
        }
        out.replace_range(start..end, &replacement);
    }
    out
}

/// CSV report of the whole store in display order.
pub fn export_csv<W: Write>(writer: W, store: &EntryStore) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record([
        "identity",
        "kind",
        "status",
        "source",
        "translation",
        "comment",
        "line",
    ])?;
    for entry in store.display_entries(DisplayOrder::Position) {
        let line = entry.line.map(|l| l.to_string()).unwrap_or_default();
        wtr.write_record([
            entry.identity.as_str(),
            entry.kind.as_str(),
            entry.status.as_str(),
            entry.source_text.as_str(),
            entry.translated_text.as_str(),
            entry.comment.as_str(),
            line.as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Translation-state counts. `with_warnings` reflects the flags currently on
/// the entries; run [`validate_all`] first for fresh numbers.
pub fn stats(store: &EntryStore) -> StoreStats {
    let mut s = StoreStats {
        total: store.len(),
        ..StoreStats::default()
    };
    for entry in store.iter() {
        match entry.status {
            Status::Untranslated => s.untranslated += 1,
            Status::Translated => s.translated += 1,
            Status::Fuzzy => s.fuzzy += 1,
            Status::Reviewed => s.reviewed += 1,
            Status::Ignored => s.ignored += 1,
        }
        if !entry.flags.is_empty() {
            s.with_warnings += 1;
        }
    }
    s
}
