use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// One user-defined extraction rule: a pattern whose `content` (or first)
/// capture group is the translatable payload, plus exclusion predicates.
/// Consumed, not produced, by this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionRule {
    pub name: String,
    pub pattern: String,
    /// Kind assigned to extracted entries ("Custom String", "Description", ...).
    pub kind: String,
    /// Lower wins. Rules of equal priority keep list order.
    #[serde(default)]
    pub priority: u32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub exclusions: Vec<Exclusion>,
}

fn default_enabled() -> bool {
    true
}

/// Closed set of predicates that discard a candidate. Evaluated over the
/// semantic (unescaped) text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Exclusion {
    /// Digits only, e.g. "1234".
    PureNumeric,
    /// A single `{n}` placeholder and nothing else.
    PurePlaceholder,
    /// One ASCII letter.
    SingleAsciiLetter,
    /// Punctuation, symbols and whitespace only.
    SymbolsOnly,
    /// One character repeated, e.g. "----" or "aaaa".
    RepeatedChar,
    /// Bracket/progress-bar art like "[===>  ]".
    ProgressBarLike,
    /// Untranslatable abbreviations: ID, HP, OK, N/A, ...
    KnownShortWord,
    /// Placeholders plus fewer than two letters of real text.
    PlaceholderOnlyText,
    /// User-supplied ignore pattern; a non-compiling pattern never matches.
    IgnoreRegex { pattern: String },
}

static ALL_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").expect("static regex"));
static PURE_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\{\d+\}$").expect("static regex"));
static SYMBOLS_ONLY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^[.,?!|:;\-_+=*/%&#@$^~`<>(){}\[\]\s"']+$"#).expect("static regex")
});
static PROGRESS_BAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\[\(\|\-=<>#\s]*[\]\s]*$").expect("static regex"));
static NON_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[.,?!|:;\-_+=*/%&#@$^~`<>(){}\[\]\s"'0-9]"#).expect("static regex")
});

const SHORT_WORDS: &[&str] = &[
    "ID", "HP", "MP", "XP", "LV", "CD", "UI", "OK", "X", "Y", "Z", "A", "B", "C", "N/A",
];

impl Exclusion {
    pub fn matches(&self, semantic: &str) -> bool {
        let trimmed = semantic.trim();
        match self {
            Exclusion::PureNumeric => !trimmed.is_empty() && ALL_DIGITS.is_match(trimmed),
            Exclusion::PurePlaceholder => PURE_PLACEHOLDER.is_match(trimmed),
            Exclusion::SingleAsciiLetter => {
                let mut chars = trimmed.chars();
                matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_alphabetic())
            }
            Exclusion::SymbolsOnly => trimmed.is_empty() || SYMBOLS_ONLY.is_match(semantic),
            Exclusion::RepeatedChar => {
                let mut chars = trimmed.chars();
                match chars.next() {
                    Some(first) => {
                        trimmed.chars().count() >= 2 && chars.all(|c| c == first)
                    }
                    None => false,
                }
            }
            Exclusion::ProgressBarLike => {
                trimmed.chars().count() > 2 && PROGRESS_BAR.is_match(trimmed)
            }
            Exclusion::KnownShortWord => SHORT_WORDS.contains(&trimmed.to_uppercase().as_str()),
            Exclusion::PlaceholderOnlyText => {
                if !crate::PLACEHOLDER_TOKEN.is_match(trimmed) {
                    return false;
                }
                let without = crate::PLACEHOLDER_TOKEN.replace_all(trimmed, "");
                let text_only = NON_TEXT.replace_all(&without, "");
                text_only.trim().chars().count() < 2
            }
            Exclusion::IgnoreRegex { pattern } => Regex::new(pattern)
                .map(|re| re.is_match(semantic))
                .unwrap_or(false),
        }
    }
}

/// The standard exclusion set applied by the default rules.
pub fn default_exclusions() -> Vec<Exclusion> {
    vec![
        Exclusion::PureNumeric,
        Exclusion::PurePlaceholder,
        Exclusion::SingleAsciiLetter,
        Exclusion::SymbolsOnly,
        Exclusion::RepeatedChar,
        Exclusion::ProgressBarLike,
        Exclusion::KnownShortWord,
        Exclusion::PlaceholderOnlyText,
    ]
}

/// Built-in rule list: named constructs first, then any quoted string.
pub fn default_rules() -> Vec<ExtractionRule> {
    let quoted = r#""((?:[^"\\]|\\.)*)""#;
    vec![
        ExtractionRule {
            name: "Custom String".into(),
            pattern: format!(r#"(?:自定义字符串|Custom String)\s*\(\s*{quoted}"#),
            kind: "Custom String".into(),
            priority: 0,
            enabled: true,
            exclusions: default_exclusions(),
        },
        ExtractionRule {
            name: "Description".into(),
            pattern: format!(r#"(?:Description|描述)\s*:\s*{quoted}"#),
            kind: "Description".into(),
            priority: 1,
            enabled: true,
            exclusions: default_exclusions(),
        },
        ExtractionRule {
            name: "Mode Name".into(),
            pattern: format!(r#"(?:Mode Name|模式名称)\s*:\s*{quoted}"#),
            kind: "Mode Name".into(),
            priority: 2,
            enabled: true,
            exclusions: default_exclusions(),
        },
        ExtractionRule {
            name: "Quoted String".into(),
            pattern: quoted.to_string(),
            kind: "Custom String".into(),
            priority: 10,
            enabled: true,
            exclusions: default_exclusions(),
        },
    ]
}
