//! Scans raw source text against an ordered list of extraction rules and
//! produces candidate entries with stable content-derived identity.
//!
//! Rules are plain data evaluated by one uniform interpreter; exclusion
//! predicates are a closed enum, not open-ended rule subclasses. Re-running
//! over byte-identical input with the same rule list yields a byte-identical
//! output sequence, which is what reconciliation depends on.

use locsync_core::{derive_identity, normalize_ws, Context, Entry, ExtractionError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

mod rules;

pub use rules::{default_rules, ExtractionRule, Exclusion};

/// Knobs passed explicitly into [`extract`]; no ambient globals.
#[derive(Debug, Clone)]
pub struct ExtractPolicy {
    /// Lines of surrounding source kept on each side of an entry.
    pub context_radius: usize,
}

impl Default for ExtractPolicy {
    fn default() -> Self {
        ExtractPolicy { context_radius: 2 }
    }
}

#[derive(Debug, Default)]
pub struct ExtractOutcome {
    pub entries: Vec<Entry>,
    /// Rules whose pattern failed to compile. Extraction continued without them.
    pub skipped_rules: Vec<ExtractionError>,
}

/// Undo source-level escapes into the semantic string (`\n`, `\t`, `\"`, `\\`).
/// Unknown escapes are kept verbatim.
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

struct RawCandidate {
    raw: String,
    semantic: String,
    kind: String,
    start: usize,
    end: usize,
}

/// Run every enabled rule over `text`. Overlaps resolve by rule priority
/// (then list order), then leftmost match; a claimed span is consumed even
/// when the candidate is later discarded by an exclusion predicate.
pub fn extract(
    text: &str,
    rules: &[ExtractionRule],
    policy: &ExtractPolicy,
) -> ExtractOutcome {
    let lines: Vec<&str> = text.lines().collect();

    let mut ordered: Vec<(usize, &ExtractionRule)> = rules
        .iter()
        .enumerate()
        .filter(|(_, r)| r.enabled)
        .map(|(i, r)| (i, r))
        .collect();
    ordered.sort_by_key(|(i, r)| (r.priority, *i));

    let mut skipped_rules = Vec::new();
    let mut claimed: Vec<(usize, usize)> = Vec::new();
    let mut candidates: Vec<RawCandidate> = Vec::new();

    for (_, rule) in ordered {
        let re = match Regex::new(&rule.pattern) {
            Ok(re) => re,
            Err(err) => {
                let skip = ExtractionError {
                    rule: rule.name.clone(),
                    message: err.to_string(),
                };
                tracing::warn!(event = "rule_skipped", rule = %skip.rule, error = %skip.message);
                skipped_rules.push(skip);
                continue;
            }
        };
        for caps in re.captures_iter(text) {
            let m = caps
                .name("content")
                .or_else(|| caps.get(1))
                .unwrap_or_else(|| caps.get(0).expect("capture 0 always present"));
            let (start, end) = (m.start(), m.end());
            if claimed.iter().any(|&(s, e)| start < e && s < end) {
                continue;
            }
            claimed.push((start, end));
            let raw = m.as_str().to_string();
            let semantic = unescape(&raw);
            if rule.exclusions.iter().any(|x| x.matches(&semantic)) {
                continue;
            }
            candidates.push(RawCandidate {
                raw,
                semantic,
                kind: rule.kind.clone(),
                start,
                end,
            });
        }
    }

    candidates.sort_by_key(|c| (c.start, c.end));

    // Occurrence ordinal among byte-identical (source, kind, context) tuples,
    // counted in document order so identity stays positional-independent.
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut entries = Vec::with_capacity(candidates.len());
    for cand in candidates {
        let line_num = text[..cand.start].matches('\n').count() + 1;
        let context = window(&lines, line_num, policy.context_radius);
        let dup_key = format!(
            "{}::{}::{}",
            normalize_ws(&cand.semantic),
            cand.kind,
            locsync_core::fingerprint("", &context)
        );
        let ordinal = {
            let slot = seen.entry(dup_key).or_insert(0);
            let n = *slot;
            *slot += 1;
            n
        };
        let mut entry = Entry::new(cand.semantic, cand.kind, context);
        entry.identity = derive_identity(&entry.source_text, &entry.kind, &entry.context, ordinal);
        entry.raw_text = cand.raw;
        entry.line = Some(line_num);
        entry.span = Some((cand.start, cand.end));
        entries.push(entry);
    }

    ExtractOutcome {
        entries,
        skipped_rules,
    }
}

fn window(lines: &[&str], line_num: usize, radius: usize) -> Context {
    if lines.is_empty() || line_num == 0 {
        return Context::default();
    }
    let idx = line_num - 1;
    let start = idx.saturating_sub(radius);
    let end = (idx + radius + 1).min(lines.len());
    if start >= end {
        return Context::default();
    }
    Context {
        lines: lines[start..end].iter().map(|s| s.to_string()).collect(),
        active_line: Some(idx - start),
    }
}

pub(crate) static PLACEHOLDER_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\d+\}").expect("static regex"));

#[cfg(test)]
mod tests {
    use super::*;

    fn quoted() -> Vec<ExtractionRule> {
        default_rules()
    }

    #[test]
    fn extracts_quoted_strings_in_document_order() {
        let src = "Custom String(\"Hello, {0}!\")\nCustom String(\"Goodbye\")\n";
        let out = extract(src, &quoted(), &ExtractPolicy::default());
        assert!(out.skipped_rules.is_empty());
        let texts: Vec<&str> = out.entries.iter().map(|e| e.source_text.as_str()).collect();
        assert_eq!(texts, ["Hello, {0}!", "Goodbye"]);
        assert_eq!(out.entries[0].line, Some(1));
        assert_eq!(out.entries[1].line, Some(2));
    }

    #[test]
    fn is_deterministic() {
        let src = "say(\"one\")\nsay(\"two\")\nsay(\"{0}\")\nsay(\"three three\")\n";
        let a = extract(src, &quoted(), &ExtractPolicy::default());
        let b = extract(src, &quoted(), &ExtractPolicy::default());
        let ids_a: Vec<_> = a.entries.iter().map(|e| e.identity.clone()).collect();
        let ids_b: Vec<_> = b.entries.iter().map(|e| e.identity.clone()).collect();
        assert_eq!(ids_a, ids_b);
        let fp_a: Vec<_> = a.entries.iter().map(|e| e.origin_fingerprint.clone()).collect();
        let fp_b: Vec<_> = b.entries.iter().map(|e| e.origin_fingerprint.clone()).collect();
        assert_eq!(fp_a, fp_b);
    }

    #[test]
    fn exclusions_discard_noise() {
        let src = r#"a("1234") b("{0}") c("x") d("....") e("aaaa") f("OK") g("Real text")"#;
        let out = extract(src, &quoted(), &ExtractPolicy::default());
        let texts: Vec<&str> = out.entries.iter().map(|e| e.source_text.as_str()).collect();
        assert_eq!(texts, ["Real text"]);
    }

    #[test]
    fn malformed_rule_is_skipped_but_others_run() {
        let rules = vec![
            ExtractionRule {
                name: "broken".into(),
                pattern: "([unclosed".into(),
                kind: "Broken".into(),
                priority: 0,
                enabled: true,
                exclusions: Vec::new(),
            },
            ExtractionRule {
                name: "quoted".into(),
                pattern: r#""((?:[^"\\]|\\.)*)""#.into(),
                kind: "Custom String".into(),
                priority: 1,
                enabled: true,
                exclusions: Vec::new(),
            },
        ];
        let out = extract(r#"x("hello")"#, &rules, &ExtractPolicy::default());
        assert_eq!(out.skipped_rules.len(), 1);
        assert_eq!(out.skipped_rules[0].rule, "broken");
        assert_eq!(out.entries.len(), 1);
        assert_eq!(out.entries[0].source_text, "hello");
    }

    #[test]
    fn earlier_rule_claims_overlapping_span() {
        let rules = vec![
            ExtractionRule {
                name: "description".into(),
                pattern: r#"Description:\s*"((?:[^"\\]|\\.)*)""#.into(),
                kind: "Description".into(),
                priority: 0,
                enabled: true,
                exclusions: Vec::new(),
            },
            ExtractionRule {
                name: "any quoted".into(),
                pattern: r#""((?:[^"\\]|\\.)*)""#.into(),
                kind: "Custom String".into(),
                priority: 1,
                enabled: true,
                exclusions: Vec::new(),
            },
        ];
        let out = extract(r#"Description: "A mode" and "other""#, &rules, &ExtractPolicy::default());
        assert_eq!(out.entries.len(), 2);
        assert_eq!(out.entries[0].kind, "Description");
        assert_eq!(out.entries[0].source_text, "A mode");
        assert_eq!(out.entries[1].kind, "Custom String");
        assert_eq!(out.entries[1].source_text, "other");
    }

    #[test]
    fn duplicate_payloads_get_distinct_identities() {
        let src = "a(\"Hi\")\na(\"Hi\")\n";
        let out = extract(src, &quoted(), &ExtractPolicy::default());
        assert_eq!(out.entries.len(), 2);
        assert_ne!(out.entries[0].identity, out.entries[1].identity);
    }

    #[test]
    fn unescapes_semantic_text_but_keeps_raw() {
        let src = r#"say("line one\nline two")"#;
        let out = extract(src, &quoted(), &ExtractPolicy::default());
        assert_eq!(out.entries[0].source_text, "line one\nline two");
        assert_eq!(out.entries[0].raw_text, r"line one\nline two");
    }

    #[test]
    fn context_window_is_bounded() {
        let src = "l1\nl2\nsay(\"mid\")\nl4\nl5\nl6\n";
        let out = extract(src, &quoted(), &ExtractPolicy::default());
        let ctx = &out.entries[0].context;
        assert_eq!(ctx.lines, ["l1", "l2", "say(\"mid\")", "l4", "l5"]);
        assert_eq!(ctx.active_line, Some(2));
    }
}
