//! In-memory translation-memory collection plus the Memory Matcher: ranked
//! exact and fuzzy suggestions for a query string. Matching is a pure
//! function; the store mutates only through explicit upserts.

use chrono::{DateTime, Utc};
use locsync_core::{normalize_ws, Result};
use locsync_domain::Suggestion;
use locsync_reconcile::source_similarity;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// One record of the memory collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmRecord {
    pub source_text: String,
    pub target_text: String,
    pub source_lang: String,
    pub target_lang: String,
    #[serde(default)]
    pub created_by: String,
    pub creation_date: DateTime<Utc>,
    #[serde(default)]
    pub modified_by: String,
    pub last_modified_date: DateTime<Utc>,
    #[serde(default)]
    pub usage_count: u64,
    #[serde(default)]
    pub comment: String,
}

impl TmRecord {
    pub fn new(
        source_text: impl Into<String>,
        target_text: impl Into<String>,
        source_lang: impl Into<String>,
        target_lang: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        TmRecord {
            source_text: source_text.into(),
            target_text: target_text.into(),
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
            created_by: "locsync".into(),
            creation_date: now,
            modified_by: "locsync".into(),
            last_modified_date: now,
            usage_count: 1,
            comment: String::new(),
        }
    }
}

fn normalize_key(s: &str) -> String {
    normalize_ws(s).to_lowercase()
}

/// Insertion-ordered record collection with a normalized-source index.
#[derive(Debug, Default)]
pub struct TmStore {
    records: Vec<TmRecord>,
    by_source: HashMap<String, Vec<usize>>,
}

impl TmStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[TmRecord] {
        &self.records
    }

    pub fn push(&mut self, record: TmRecord) {
        let key = normalize_key(&record.source_text);
        self.by_source.entry(key).or_default().push(self.records.len());
        self.records.push(record);
    }

    /// Exact (normalized) lookup: first inserted record wins.
    pub fn exact(&self, source_text: &str) -> Option<&TmRecord> {
        self.by_source
            .get(&normalize_key(source_text))
            .and_then(|ix| ix.first())
            .map(|&i| &self.records[i])
    }

    /// Insert a confirmed translation. An existing record for the same
    /// (exact) source gets its target refreshed and usage counted; otherwise
    /// a fresh record is appended.
    pub fn upsert(
        &mut self,
        source_text: &str,
        target_text: &str,
        source_lang: &str,
        target_lang: &str,
    ) {
        if source_text.trim().is_empty() {
            return;
        }
        let existing = self
            .by_source
            .get(&normalize_key(source_text))
            .into_iter()
            .flatten()
            .copied()
            .find(|&i| self.records[i].source_text == source_text);
        match existing {
            Some(i) => {
                let rec = &mut self.records[i];
                rec.target_text = target_text.to_string();
                rec.last_modified_date = Utc::now();
                rec.modified_by = "locsync".into();
                rec.usage_count += 1;
            }
            None => {
                self.push(TmRecord::new(
                    source_text,
                    target_text,
                    source_lang,
                    target_lang,
                ));
            }
        }
    }

    /// Load a JSONL memory file. Unparseable lines are skipped with a
    /// warning; a missing file yields an empty store.
    pub fn load_jsonl(path: &Path) -> Result<TmStore> {
        let mut store = TmStore::new();
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(store),
            Err(e) => return Err(e.into()),
        };
        for (n, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<TmRecord>(&line) {
                Ok(rec) => store.push(rec),
                Err(err) => {
                    tracing::warn!(event = "tm_line_skipped", line = n + 1, error = %err);
                }
            }
        }
        Ok(store)
    }

    /// Write the store as JSONL through a temp file renamed into place.
    pub fn save_jsonl(&self, path: &Path) -> Result<()> {
        let tmp = path.with_extension("jsonl.tmp");
        {
            let mut w = BufWriter::new(File::create(&tmp)?);
            for rec in &self.records {
                serde_json::to_writer(&mut w, rec)?;
                w.write_all(b"\n")?;
            }
            w.flush()?;
        }
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

/// Knobs for suggestion ranking, passed explicitly.
#[derive(Debug, Clone)]
pub struct MatchPolicy {
    /// Advisory threshold; lower than reconciliation's because nothing is
    /// auto-applied.
    pub min_similarity: f64,
    pub max_suggestions: usize,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        MatchPolicy {
            min_similarity: 0.5,
            max_suggestions: 5,
        }
    }
}

/// Rank suggestions for `query`: normalized-exact matches first in insertion
/// order, then fuzzy matches sorted by descending score, ties broken by
/// shorter source then insertion order. Pure; neither the store nor any
/// entry is touched.
pub fn suggest(query: &str, store: &TmStore, policy: &MatchPolicy) -> Vec<Suggestion> {
    let key = normalize_key(query);
    let mut out: Vec<Suggestion> = Vec::new();

    for rec in store.records() {
        if normalize_key(&rec.source_text) == key {
            out.push(Suggestion {
                source_text: rec.source_text.clone(),
                translated_text: rec.target_text.clone(),
                score: 1.0,
                exact: true,
            });
            if out.len() >= policy.max_suggestions {
                return out;
            }
        }
    }

    let mut fuzzy: Vec<(f64, usize, &TmRecord)> = Vec::new();
    for (i, rec) in store.records().iter().enumerate() {
        if normalize_key(&rec.source_text) == key {
            continue;
        }
        let score = source_similarity(query, &rec.source_text);
        if score >= policy.min_similarity {
            fuzzy.push((score, i, rec));
        }
    }
    fuzzy.sort_by(|a, b| {
        b.0.total_cmp(&a.0)
            .then_with(|| {
                a.2.source_text
                    .chars()
                    .count()
                    .cmp(&b.2.source_text.chars().count())
            })
            .then(a.1.cmp(&b.1))
    });
    for (score, _, rec) in fuzzy {
        if out.len() >= policy.max_suggestions {
            break;
        }
        out.push(Suggestion {
            source_text: rec.source_text.clone(),
            translated_text: rec.target_text.clone(),
            score,
            exact: false,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(pairs: &[(&str, &str)]) -> TmStore {
        let mut s = TmStore::new();
        for (src, tgt) in pairs {
            s.push(TmRecord::new(*src, *tgt, "en", "ja"));
        }
        s
    }

    #[test]
    fn exact_matches_rank_first_in_insertion_order() {
        let s = store(&[
            ("press e  to interact", "first"),
            ("Open menu", "menu"),
            ("Press E to interact", "second"),
        ]);
        let got = suggest("Press E to interact", &s, &MatchPolicy::default());
        assert!(got[0].exact && got[1].exact);
        assert_eq!(got[0].translated_text, "first");
        assert_eq!(got[1].translated_text, "second");
    }

    #[test]
    fn fuzzy_matches_sorted_by_score() {
        let s = store(&[
            ("Press E to interact with object", "far"),
            ("Press E to interact now", "near"),
            ("zzzz qqqq jjjj", "no"),
        ]);
        let got = suggest("Press E to interact", &s, &MatchPolicy::default());
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].translated_text, "near");
        assert_eq!(got[1].translated_text, "far");
        assert!(got[0].score > got[1].score);
        assert!(!got[0].exact);
    }

    #[test]
    fn result_set_is_bounded() {
        let s = store(&[
            ("Press E to interact 1", "a"),
            ("Press E to interact 2", "b"),
            ("Press E to interact 3", "c"),
        ]);
        let policy = MatchPolicy {
            max_suggestions: 2,
            ..MatchPolicy::default()
        };
        assert_eq!(suggest("Press E to interact", &s, &policy).len(), 2);
    }

    #[test]
    fn suggestion_is_pure() {
        let s = store(&[("Press E to interact", "x")]);
        let a = suggest("Press E", &s, &MatchPolicy::default());
        let b = suggest("Press E", &s, &MatchPolicy::default());
        assert_eq!(a.len(), b.len());
        assert_eq!(s.records()[0].usage_count, 1);
    }

    #[test]
    fn upsert_refreshes_existing_record() {
        let mut s = store(&[("Cancel", "old")]);
        s.upsert("Cancel", "new", "en", "ja");
        assert_eq!(s.len(), 1);
        assert_eq!(s.records()[0].target_text, "new");
        assert_eq!(s.records()[0].usage_count, 2);

        s.upsert("Confirm", "ok", "en", "ja");
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn upsert_ignores_blank_source() {
        let mut s = TmStore::new();
        s.upsert("   ", "x", "en", "ja");
        assert!(s.is_empty());
    }

    #[test]
    fn jsonl_round_trips_and_skips_junk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.jsonl");

        let s = store(&[("Cancel", "キャンセル"), ("Confirm", "確認")]);
        s.save_jsonl(&path).unwrap();

        // Corrupt one line in the middle; the rest must still load.
        let mut text = std::fs::read_to_string(&path).unwrap();
        text.push_str("{not json}\n");
        std::fs::write(&path, text).unwrap();

        let loaded = TmStore::load_jsonl(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.exact("cancel").unwrap().target_text, "キャンセル");
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = TmStore::load_jsonl(&dir.path().join("absent.jsonl")).unwrap();
        assert!(loaded.is_empty());
    }
}
