//! Mechanical checks over a (source, translation) pair. Every check is
//! independent and runs unconditionally; findings are advisory signals for
//! the entry's flags, never blocking. The whole module is a pure function of
//! its inputs and the loaded baseline table.

use locsync_core::{Finding, FindingKind};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

mod baselines;

pub use baselines::{RatioBaselines, RatioEntry};

/// Knobs for one validation run, passed explicitly (no ambient globals).
#[derive(Debug, Clone)]
pub struct ValidatePolicy {
    /// Override for the placeholder token pattern. When unset, brace-style
    /// `{...}` and printf-style `%s` tokens are both recognized.
    pub placeholder_pattern: Option<String>,
    /// Allowed difference in line-break counts.
    pub line_tolerance: usize,
    /// Z-style distance (in spreads) beyond which a length anomaly is
    /// minor / major.
    pub minor_deviation: f64,
    pub major_deviation: f64,
    /// Fallback multiplicative bands used when the baseline has no spread:
    /// actual beyond `expected * band` (or below `expected / band`) trips.
    pub minor_band: f64,
    pub major_band: f64,
}

impl Default for ValidatePolicy {
    fn default() -> Self {
        ValidatePolicy {
            placeholder_pattern: None,
            line_tolerance: 0,
            minor_deviation: 2.0,
            major_deviation: 3.0,
            minor_band: 2.0,
            major_band: 2.5,
        }
    }
}

static BRACE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{[^{}]*\}").expect("static regex"));
static PRINTF_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"%(\d+\$)?[-+ 0#]*(\d+|\*)?(\.(\d+|\*))?[hlLzZjpt]*[diouxXeEfFgGcrs%]")
        .expect("static regex")
});
static NON_LINGUISTIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{P}\p{N}\p{S}\p{Z}\s]").expect("static regex"));

/// ASCII punctuation and its fullwidth counterpart count as the same class.
const PUNCT_PAIRS: &[(char, char)] = &[
    ('.', '。'),
    (',', '，'),
    ('?', '？'),
    ('!', '！'),
    (':', '：'),
    (';', '；'),
    ('(', '（'),
    (')', '）'),
];

fn is_boundary_punct(c: char) -> bool {
    PUNCT_PAIRS.iter().any(|&(a, f)| c == a || c == f)
}

fn punct_equivalent(a: char, b: char) -> bool {
    a == b
        || PUNCT_PAIRS
            .iter()
            .any(|&(h, f)| (a == h && b == f) || (a == f && b == h))
}

/// Multiset of placeholder tokens in `text`.
fn placeholder_counts(text: &str, custom: Option<&Regex>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    match custom {
        Some(re) => {
            for m in re.find_iter(text) {
                *counts.entry(m.as_str().to_string()).or_insert(0) += 1;
            }
        }
        None => {
            for re in [&*BRACE_TOKEN, &*PRINTF_TOKEN] {
                for m in re.find_iter(text) {
                    *counts.entry(m.as_str().to_string()).or_insert(0) += 1;
                }
            }
        }
    }
    counts
}

/// Code points that carry language: placeholders, punctuation, digits,
/// symbols and whitespace stripped away.
pub fn linguistic_length(text: &str) -> usize {
    let without_tokens = BRACE_TOKEN.replace_all(text, "");
    let without_tokens = PRINTF_TOKEN.replace_all(&without_tokens, "");
    NON_LINGUISTIC.replace_all(&without_tokens, "").chars().count()
}

fn first_cased_char(s: &str) -> Option<char> {
    let c = s.trim_start().chars().next()?;
    (c.is_lowercase() || c.is_uppercase()).then_some(c)
}

/// Run every check over one (source, translation) pair. `expected_ratio` is
/// the baseline table's entry for the locale pair, if any; without it the
/// length check is skipped. Identical inputs always yield identical findings.
pub fn validate(
    source: &str,
    translation: &str,
    expected_ratio: Option<RatioEntry>,
    policy: &ValidatePolicy,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    if translation.is_empty() {
        return findings;
    }

    let custom = policy
        .placeholder_pattern
        .as_deref()
        .and_then(|p| Regex::new(p).ok());

    // Placeholder multiset.
    let src_counts = placeholder_counts(source, custom.as_ref());
    let tr_counts = placeholder_counts(translation, custom.as_ref());
    if src_counts != tr_counts {
        let mut missing = Vec::new();
        let mut extra = Vec::new();
        for key in src_counts.keys().chain(tr_counts.keys()) {
            let s = src_counts.get(key).copied().unwrap_or(0);
            let t = tr_counts.get(key).copied().unwrap_or(0);
            if s > t && !missing.contains(key) {
                missing.push(key.clone());
            } else if t > s && !extra.contains(key) {
                extra.push(key.clone());
            }
        }
        let mut parts = Vec::new();
        if !missing.is_empty() {
            parts.push(format!("missing: {}", missing.join(", ")));
        }
        if !extra.is_empty() {
            parts.push(format!("extra: {}", extra.join(", ")));
        }
        findings.push(Finding::major(
            FindingKind::PlaceholderMismatch,
            format!("placeholder mismatch ({})", parts.join("; ")),
        ));
    }

    // Line-break counts.
    let src_lines = source.matches('\n').count();
    let tr_lines = translation.matches('\n').count();
    if src_lines.abs_diff(tr_lines) > policy.line_tolerance {
        findings.push(Finding::major(
            FindingKind::LineCountMismatch,
            format!("line count differs (source {src_lines}, translation {tr_lines})"),
        ));
    }

    findings.extend(boundary_check(source, translation));

    // Initial capitalization.
    if let (Some(s), Some(t)) = (first_cased_char(source), first_cased_char(translation)) {
        if s.is_uppercase() != t.is_uppercase() {
            findings.push(Finding::minor(
                FindingKind::CapitalizationMismatch,
                "initial capitalization differs from source",
            ));
        }
    }

    // Doubled word in the translation ("the the").
    if let Some(word) = repeated_word(translation) {
        findings.push(Finding::minor(
            FindingKind::RepeatedWord,
            format!("repeated word: '{word}'"),
        ));
    }

    if let Some(f) = length_check(source, translation, expected_ratio, policy) {
        findings.push(f);
    }

    findings
}

fn boundary_check(source: &str, translation: &str) -> Vec<Finding> {
    let mut findings = Vec::new();

    let lead = |s: &str| s.starts_with(char::is_whitespace);
    let trail = |s: &str| s.ends_with(char::is_whitespace);
    if lead(source) != lead(translation) {
        findings.push(Finding::major(
            FindingKind::BoundaryMismatch,
            "leading whitespace differs from source",
        ));
    }
    if trail(source) != trail(translation) {
        findings.push(Finding::major(
            FindingKind::BoundaryMismatch,
            "trailing whitespace differs from source",
        ));
    }

    let s_strip = source.trim();
    let t_strip = translation.trim();
    if s_strip.is_empty() || t_strip.is_empty() {
        return findings;
    }

    // Terminal punctuation class, tolerating a "(s)" plural marker on the
    // source and treating fullwidth forms as equivalent.
    let mut s_term = s_strip;
    if let Some(stripped) = s_term
        .strip_suffix("(s)")
        .or_else(|| s_term.strip_suffix("(S)"))
    {
        if !stripped.trim_end().is_empty() {
            s_term = stripped.trim_end();
        }
    }
    let s_end = s_term.chars().last().expect("non-empty");
    let t_end = t_strip.chars().last().expect("non-empty");
    let s_is_punct = is_boundary_punct(s_end);
    let t_is_punct = is_boundary_punct(t_end);
    if s_is_punct != t_is_punct {
        findings.push(Finding::major(
            FindingKind::BoundaryMismatch,
            format!("terminal punctuation presence differs ('{s_end}' vs '{t_end}')"),
        ));
    } else if s_is_punct {
        if !punct_equivalent(s_end, t_end) {
            findings.push(Finding::major(
                FindingKind::BoundaryMismatch,
                format!("terminal punctuation differs ('{s_end}' vs '{t_end}')"),
            ));
        } else {
            // Same terminal mark; whitespace immediately before it must agree
            // ("Bonjour {0} !" vs "Hello, {0}!").
            let before = |s: &str| {
                let mut it = s.chars().rev();
                it.next();
                it.next().map(|c| c.is_whitespace()).unwrap_or(false)
            };
            if before(s_term) != before(t_strip) {
                findings.push(Finding::major(
                    FindingKind::BoundaryMismatch,
                    "spacing before terminal punctuation differs",
                ));
            }
        }
    }

    // Leading punctuation class.
    let s_start = s_strip.chars().next().expect("non-empty");
    let t_start = t_strip.chars().next().expect("non-empty");
    let s_p = is_boundary_punct(s_start);
    let t_p = is_boundary_punct(t_start);
    if s_p != t_p || (s_p && !punct_equivalent(s_start, t_start)) {
        findings.push(Finding::major(
            FindingKind::BoundaryMismatch,
            format!("starting punctuation differs ('{s_start}' vs '{t_start}')"),
        ));
    }

    findings
}

fn repeated_word(text: &str) -> Option<String> {
    let mut prev: Option<String> = None;
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let lower = word.to_lowercase();
        if prev.as_deref() == Some(lower.as_str()) {
            return Some(word.to_string());
        }
        prev = Some(lower);
    }
    None
}

fn length_check(
    source: &str,
    translation: &str,
    expected: Option<RatioEntry>,
    policy: &ValidatePolicy,
) -> Option<Finding> {
    let expected = expected?;
    if source == translation || source.chars().count() <= 4 {
        return None;
    }
    let len_src = linguistic_length(source);
    let len_tr = linguistic_length(translation);
    if len_src == 0 || expected.mean <= 0.0 {
        return None;
    }
    let actual = len_tr as f64 / len_src as f64;

    if expected.spread > 0.0 {
        let distance = (actual - expected.mean).abs() / expected.spread;
        if distance > policy.major_deviation {
            return Some(Finding::major(
                FindingKind::LengthAnomaly,
                anomaly_msg(actual, expected.mean, distance),
            ));
        }
        if distance > policy.minor_deviation {
            return Some(Finding::minor(
                FindingKind::LengthAnomaly,
                anomaly_msg(actual, expected.mean, distance),
            ));
        }
        return None;
    }

    // No spread in the baseline: multiplicative bands.
    if actual > expected.mean * policy.major_band || actual < expected.mean / policy.major_band {
        return Some(Finding::major(
            FindingKind::LengthAnomaly,
            band_msg(actual, expected.mean),
        ));
    }
    if actual > expected.mean * policy.minor_band || actual < expected.mean / policy.minor_band {
        return Some(Finding::minor(
            FindingKind::LengthAnomaly,
            band_msg(actual, expected.mean),
        ));
    }
    None
}

fn anomaly_msg(actual: f64, mean: f64, distance: f64) -> String {
    format!(
        "unusual expansion ratio {actual:.2}x (expected around {mean:.2}x, {distance:.1} spreads away)"
    )
}

fn band_msg(actual: f64, mean: f64) -> String {
    format!("unusual expansion ratio {actual:.2}x (expected around {mean:.2}x)")
}

#[cfg(test)]
mod tests {
    use super::*;
    use locsync_core::Severity;

    fn kinds(findings: &[Finding]) -> Vec<FindingKind> {
        findings.iter().map(|f| f.kind).collect()
    }

    fn run(src: &str, tr: &str) -> Vec<Finding> {
        validate(src, tr, None, &ValidatePolicy::default())
    }

    #[test]
    fn clean_pair_has_no_findings() {
        assert!(run("Press E to interact", "Eキーを押して操作").is_empty());
    }

    #[test]
    fn empty_translation_is_not_checked() {
        assert!(run("Has {0} and\nlines", "").is_empty());
    }

    #[test]
    fn missing_placeholder_is_major() {
        let f = run("Score: {0} of {1}", "Punkte: {0}");
        assert!(kinds(&f).contains(&FindingKind::PlaceholderMismatch));
        let finding = f
            .iter()
            .find(|f| f.kind == FindingKind::PlaceholderMismatch)
            .unwrap();
        assert_eq!(finding.severity, Severity::Major);
        assert!(finding.message.contains("{1}"));
    }

    #[test]
    fn duplicated_placeholder_counts_as_mismatch() {
        let f = run("Use {0}", "Use {0} and {0}");
        assert!(kinds(&f).contains(&FindingKind::PlaceholderMismatch));
    }

    #[test]
    fn printf_tokens_are_recognized() {
        let f = run("Loaded %d items from %s", "Geladen aus %s");
        assert!(kinds(&f).contains(&FindingKind::PlaceholderMismatch));
    }

    #[test]
    fn custom_placeholder_pattern_overrides_default() {
        let policy = ValidatePolicy {
            placeholder_pattern: Some(r"%\w+%".into()),
            ..ValidatePolicy::default()
        };
        let f = validate("Hi %name%", "Bonjour", None, &policy);
        assert!(kinds(&f).contains(&FindingKind::PlaceholderMismatch));
        let f = validate("Hi {0}", "Bonjour", None, &policy);
        assert!(!kinds(&f).contains(&FindingKind::PlaceholderMismatch));
    }

    #[test]
    fn line_count_mismatch() {
        let f = run("one\ntwo", "eins zwei");
        assert!(kinds(&f).contains(&FindingKind::LineCountMismatch));

        let policy = ValidatePolicy {
            line_tolerance: 1,
            ..ValidatePolicy::default()
        };
        let f = validate("one\ntwo", "eins zwei", None, &policy);
        assert!(!kinds(&f).contains(&FindingKind::LineCountMismatch));
    }

    #[test]
    fn spec_scenario_spacing_before_terminal_punctuation() {
        // "Hello, {0}!" -> "Bonjour {0} !": placeholders match, but the
        // space before the terminal mark differs.
        let f = run("Hello, {0}!", "Bonjour {0} !");
        assert!(kinds(&f).contains(&FindingKind::BoundaryMismatch));
        assert!(!kinds(&f).contains(&FindingKind::PlaceholderMismatch));
    }

    #[test]
    fn fullwidth_terminal_punctuation_is_equivalent() {
        let f = run("Ready?", "準備はいい？");
        assert!(!kinds(&f).contains(&FindingKind::BoundaryMismatch));
    }

    #[test]
    fn terminal_punctuation_presence_must_agree() {
        let f = run("Ready?", "Bereit");
        assert!(kinds(&f).contains(&FindingKind::BoundaryMismatch));
    }

    #[test]
    fn plural_marker_on_source_is_tolerated() {
        let f = run("Delete file(s)", "Dateien löschen");
        assert!(!kinds(&f).contains(&FindingKind::BoundaryMismatch));
    }

    #[test]
    fn whitespace_boundaries_must_agree() {
        let f = run(" padded ", "nicht");
        let boundary: Vec<_> = f
            .iter()
            .filter(|f| f.kind == FindingKind::BoundaryMismatch)
            .collect();
        assert_eq!(boundary.len(), 2, "{boundary:?}");
    }

    #[test]
    fn capitalization_is_minor() {
        let f = run("Open the door", "open the door now");
        let finding = f
            .iter()
            .find(|f| f.kind == FindingKind::CapitalizationMismatch)
            .unwrap();
        assert_eq!(finding.severity, Severity::Minor);
    }

    #[test]
    fn repeated_word_detected() {
        let f = run("Press the button", "Press the the button");
        assert!(kinds(&f).contains(&FindingKind::RepeatedWord));
        assert!(!kinds(&run("Press the button", "Drücke die Taste")).iter().any(|k| *k == FindingKind::RepeatedWord));
    }

    #[test]
    fn length_anomaly_uses_spread_distance() {
        let baseline = RatioEntry {
            mean: 1.0,
            spread: 0.2,
        };
        let policy = ValidatePolicy::default();
        // Ratio 4/24 is far below one.
        let f = validate(
            "A fairly long source sentence for the ratio check",
            "術語",
            Some(baseline),
            &policy,
        );
        let finding = f
            .iter()
            .find(|f| f.kind == FindingKind::LengthAnomaly)
            .expect("length anomaly");
        assert_eq!(finding.severity, Severity::Major);
    }

    #[test]
    fn length_check_skipped_without_baseline() {
        let f = run("A fairly long source sentence for the ratio check", "短い");
        assert!(!kinds(&f).contains(&FindingKind::LengthAnomaly));
    }

    #[test]
    fn validator_is_pure() {
        let a = run("Hello, {0}!", "Bonjour {0} !");
        let b = run("Hello, {0}!", "Bonjour {0} !");
        assert_eq!(a, b);
    }

    #[test]
    fn linguistic_length_strips_noise() {
        assert_eq!(linguistic_length("Hello, {0}!"), 5);
        assert_eq!(linguistic_length("{0} {1}"), 0);
        assert_eq!(linguistic_length("остановить"), 10);
    }
}
