//! Reconciles a previous entry set against a fresh extraction of an updated
//! source artifact: exact pass by fingerprint, fuzzy pass by similarity,
//! leftover pass for genuinely new and removed entries.
//!
//! Carry-over is maximized but a translation is never silently attributed to
//! semantically different source text: anything paired by the fuzzy pass is
//! forced to `Fuzzy` for human review.

use locsync_core::{Entry, Status};
use locsync_domain::{
    AmbiguityEvent, MatchKind, ReconcileMatch, ReconcileSummary, RemovedPolicy, SCHEMA_VERSION,
};
use std::collections::{HashMap, HashSet, VecDeque};

mod similarity;

pub use similarity::{context_similarity, source_similarity};

/// Knobs for one reconciliation run, passed explicitly.
#[derive(Debug, Clone)]
pub struct ReconcilePolicy {
    /// Minimum source similarity for a fuzzy pairing (0..1).
    pub min_similarity: f64,
    /// Top-two score gap below which an ambiguity event is recorded.
    pub ambiguity_margin: f64,
    pub removed_policy: RemovedPolicy,
}

impl Default for ReconcilePolicy {
    fn default() -> Self {
        ReconcilePolicy {
            min_similarity: 0.6,
            ambiguity_margin: 0.01,
            removed_policy: RemovedPolicy::Drop,
        }
    }
}

#[derive(Debug)]
pub struct ReconcileOutcome {
    /// The updated entry set, in new-candidate document order (plus retained
    /// removed entries at the tail under `RemovedPolicy::KeepIgnored`).
    pub entries: Vec<Entry>,
    pub matches: Vec<ReconcileMatch>,
    pub ambiguities: Vec<AmbiguityEvent>,
    pub summary: ReconcileSummary,
}

#[derive(Debug, Clone, Copy)]
struct PairScore {
    source: f64,
    context: f64,
    pos_dist: usize,
    old_idx: usize,
    new_idx: usize,
}

/// Reconcile `old` (previous store snapshot, possibly translated) with
/// `new_candidates` (fresh extractor or PO output over the updated source).
pub fn reconcile(
    old: &[Entry],
    mut new_candidates: Vec<Entry>,
    policy: &ReconcilePolicy,
) -> ReconcileOutcome {
    let mut matches = Vec::new();
    let mut old_taken = vec![false; old.len()];
    let mut new_matched = vec![false; new_candidates.len()];

    // Exact pass: identical origin fingerprint. Duplicate fingerprints pair
    // in document order on both sides.
    let mut by_fingerprint: HashMap<&str, VecDeque<usize>> = HashMap::new();
    for (i, e) in old.iter().enumerate() {
        by_fingerprint
            .entry(e.origin_fingerprint.as_str())
            .or_default()
            .push_back(i);
    }
    let mut exact = 0usize;
    for (j, cand) in new_candidates.iter_mut().enumerate() {
        let Some(queue) = by_fingerprint.get_mut(cand.origin_fingerprint.as_str()) else {
            continue;
        };
        let Some(i) = queue.pop_front() else { continue };
        let prev = &old[i];
        cand.translated_text = prev.translated_text.clone();
        cand.status = prev.status;
        cand.comment = prev.comment.clone();
        old_taken[i] = true;
        new_matched[j] = true;
        exact += 1;
        matches.push(ReconcileMatch {
            old_identity: Some(prev.identity.clone()),
            new_identity: Some(cand.identity.clone()),
            kind: MatchKind::Exact,
            confidence: 1.0,
        });
    }

    // Fuzzy pass over the remainder: greedy best-score-first assignment.
    // The ranking key is the gated quantity itself (source similarity), so
    // raising the threshold only truncates the tail of the greedy order and
    // the match count can never grow. Context similarity is the first
    // tie-break, never part of the score.
    let mut pairs: Vec<PairScore> = Vec::new();
    for (i, prev) in old.iter().enumerate() {
        if old_taken[i] {
            continue;
        }
        for (j, cand) in new_candidates.iter().enumerate() {
            if new_matched[j] {
                continue;
            }
            let src = source_similarity(&prev.source_text, &cand.source_text);
            if src < policy.min_similarity {
                continue;
            }
            pairs.push(PairScore {
                source: src,
                context: context_similarity(&prev.context, &cand.context),
                pos_dist: i.abs_diff(j),
                old_idx: i,
                new_idx: j,
            });
        }
    }
    pairs.sort_by(|a, b| {
        b.source
            .total_cmp(&a.source)
            .then(b.context.total_cmp(&a.context))
            .then(a.pos_dist.cmp(&b.pos_dist))
            .then(a.old_idx.cmp(&b.old_idx))
            .then(a.new_idx.cmp(&b.new_idx))
    });

    let mut fuzzy = 0usize;
    let mut assigned: Vec<PairScore> = Vec::new();
    for p in &pairs {
        if old_taken[p.old_idx] || new_matched[p.new_idx] {
            continue;
        }
        old_taken[p.old_idx] = true;
        new_matched[p.new_idx] = true;
        assigned.push(*p);

        let prev = &old[p.old_idx];
        let cand = &mut new_candidates[p.new_idx];
        cand.comment = prev.comment.clone();
        if prev.translated_text.is_empty() {
            // Nothing to carry; the pairing still consumes both sides.
            cand.status = Status::Untranslated;
        } else {
            cand.translated_text = prev.translated_text.clone();
            // A fuzzy match is never silently presented as confirmed.
            cand.status = Status::Fuzzy;
        }
        fuzzy += 1;
        matches.push(ReconcileMatch {
            old_identity: Some(prev.identity.clone()),
            new_identity: Some(cand.identity.clone()),
            kind: MatchKind::Fuzzy,
            confidence: p.source,
        });
    }

    // Ambiguity audit: a chosen pairing whose runner-up for the same new
    // candidate scored within the margin. Tie-break already decided; this is
    // recorded for user review, not an error.
    let mut ambiguities = Vec::new();
    for a in &assigned {
        let runner_up = pairs
            .iter()
            .filter(|p| p.new_idx == a.new_idx && p.old_idx != a.old_idx)
            .map(|p| (p.source, p.old_idx))
            .max_by(|x, y| x.0.total_cmp(&y.0).then(y.1.cmp(&x.1)));
        if let Some((score, old_idx)) = runner_up {
            if a.source - score <= policy.ambiguity_margin {
                let event = AmbiguityEvent {
                    new_identity: new_candidates[a.new_idx].identity.clone(),
                    chosen_old_identity: old[a.old_idx].identity.clone(),
                    runner_up_old_identity: old[old_idx].identity.clone(),
                    chosen_score: a.source,
                    runner_up_score: score,
                };
                tracing::warn!(
                    event = "reconcile_ambiguity",
                    new = %event.new_identity,
                    chosen = %event.chosen_old_identity,
                    runner_up = %event.runner_up_old_identity,
                    gap = event.chosen_score - event.runner_up_score,
                );
                ambiguities.push(event);
            }
        }
    }

    // Leftover pass.
    let added = new_matched.iter().filter(|m| !**m).count();
    for (j, cand) in new_candidates.iter().enumerate() {
        if !new_matched[j] {
            matches.push(ReconcileMatch {
                old_identity: None,
                new_identity: Some(cand.identity.clone()),
                kind: MatchKind::None,
                confidence: 0.0,
            });
        }
    }

    let mut removed = 0usize;
    let new_identities: HashSet<&str> = new_candidates
        .iter()
        .map(|e| e.identity.as_str())
        .collect();
    let mut retained: Vec<Entry> = Vec::new();
    for (i, prev) in old.iter().enumerate() {
        if old_taken[i] {
            continue;
        }
        removed += 1;
        matches.push(ReconcileMatch {
            old_identity: Some(prev.identity.clone()),
            new_identity: None,
            kind: MatchKind::None,
            confidence: 0.0,
        });
        if policy.removed_policy == RemovedPolicy::KeepIgnored
            && !new_identities.contains(prev.identity.as_str())
        {
            let mut kept = prev.clone();
            kept.status = Status::Ignored;
            kept.line = None;
            kept.span = None;
            retained.push(kept);
        }
    }
    new_candidates.extend(retained);

    let summary = ReconcileSummary {
        schema_version: SCHEMA_VERSION,
        exact,
        fuzzy,
        added,
        removed,
        removed_policy: policy.removed_policy,
        ambiguities: ambiguities.len(),
    };
    tracing::info!(
        event = "reconcile_done",
        exact = summary.exact,
        fuzzy = summary.fuzzy,
        added = summary.added,
        removed = summary.removed,
    );

    ReconcileOutcome {
        entries: new_candidates,
        matches,
        ambiguities,
        summary,
    }
}
