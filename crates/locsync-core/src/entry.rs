use crate::finding::Finding;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

/// Namespace for entry identities (UUIDv5 over content-derived names).
const ENTRY_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2a74_9b3e_4d05_8c11_e2a7_5b90_44d3);

/// Translation state of an entry. Transitions are restricted; see
/// [`Status::can_transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Untranslated,
    Translated,
    /// Carried over from an imperfect match; needs human review.
    Fuzzy,
    Reviewed,
    Ignored,
}

impl Status {
    /// True when the translation text is expected to be non-empty.
    pub fn expects_translation(self) -> bool {
        matches!(self, Status::Translated | Status::Fuzzy | Status::Reviewed)
    }

    pub fn can_transition(self, to: Status) -> bool {
        use Status::*;
        if self == to {
            return true;
        }
        match self {
            Untranslated => matches!(to, Translated | Ignored),
            Translated => matches!(to, Reviewed | Fuzzy | Untranslated | Ignored),
            Fuzzy => matches!(to, Translated | Reviewed | Untranslated | Ignored),
            Reviewed => matches!(to, Translated | Fuzzy | Untranslated | Ignored),
            Ignored => true,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Untranslated => "untranslated",
            Status::Translated => "translated",
            Status::Fuzzy => "fuzzy",
            Status::Reviewed => "reviewed",
            Status::Ignored => "ignored",
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("invalid status transition {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: Status,
    pub to: Status,
}

/// A bounded window of source lines around an entry, used for display and
/// for reconciliation context scoring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    pub lines: Vec<String>,
    /// Index of the entry's own line inside `lines`, if known.
    pub active_line: Option<usize>,
}

impl Context {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lowercased whitespace-split tokens of the whole window.
    pub fn tokens(&self) -> Vec<String> {
        self.lines
            .iter()
            .flat_map(|l| l.split_whitespace())
            .map(|t| t.to_lowercase())
            .collect()
    }
}

/// One translatable unit and its translation state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub identity: String,
    pub source_text: String,
    /// Raw matched slice with escapes intact, kept so the translated
    /// artifact can be re-emitted.
    #[serde(default)]
    pub raw_text: String,
    #[serde(default)]
    pub translated_text: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub comment: String,
    /// Rule-assigned kind ("Custom String", "PO Import", ...).
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub context: Context,
    /// 1-based line of the payload in the source artifact. Display only,
    /// never part of identity.
    #[serde(default)]
    pub line: Option<usize>,
    /// Byte span of the raw payload in the source artifact.
    #[serde(default)]
    pub span: Option<(usize, usize)>,
    /// Validator findings. Always derivable, never persisted as truth.
    #[serde(skip)]
    pub flags: Vec<Finding>,
    pub origin_fingerprint: String,
}

impl Entry {
    pub fn new(source_text: String, kind: String, context: Context) -> Self {
        let fp = fingerprint(&source_text, &context);
        Entry {
            identity: derive_identity(&source_text, &kind, &context, 0),
            source_text,
            raw_text: String::new(),
            translated_text: String::new(),
            status: Status::Untranslated,
            comment: String::new(),
            kind,
            context,
            line: None,
            span: None,
            flags: Vec::new(),
            origin_fingerprint: fp,
        }
    }

    /// Set the translation while keeping the status invariant: a non-empty
    /// translation never sits on `Untranslated`, an empty one never on a
    /// translated state. Editing a reviewed entry drops it back to
    /// `Translated`.
    pub fn set_translation(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text == self.translated_text {
            return;
        }
        self.translated_text = text;
        if self.translated_text.is_empty() {
            if self.status.expects_translation() {
                self.status = Status::Untranslated;
            }
        } else {
            match self.status {
                Status::Untranslated => self.status = Status::Translated,
                Status::Reviewed => self.status = Status::Translated,
                _ => {}
            }
        }
    }

    /// Explicit status change along the allowed edges.
    pub fn set_status(&mut self, to: Status) -> Result<(), InvalidTransition> {
        if !self.status.can_transition(to) {
            return Err(InvalidTransition {
                from: self.status,
                to,
            });
        }
        if to.expects_translation() && self.translated_text.is_empty() {
            return Err(InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    /// Translation escaped for splicing back into source code
    /// (`\` -> `\\`, `"` -> `\"`, newline -> `\n`).
    pub fn raw_translation(&self) -> String {
        let mut out = String::with_capacity(self.translated_text.len() + 8);
        for ch in self.translated_text.chars() {
            match ch {
                '\\' => out.push_str("\\\\"),
                '"' => out.push_str("\\\""),
                '\n' => out.push_str("\\n"),
                _ => out.push(ch),
            }
        }
        out
    }
}

/// Collapse runs of whitespace and trim, for identity and exact-match
/// normalization.
pub fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Content hash used for fast exact-match reconciliation: source text plus
/// whitespace-normalized context lines.
pub fn fingerprint(source_text: &str, context: &Context) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source_text.as_bytes());
    hasher.update([0x1f]);
    for line in &context.lines {
        hasher.update(normalize_ws(line).as_bytes());
        hasher.update([0x1e]);
    }
    let digest = hasher.finalize();
    let mut out = String::with_capacity(64);
    for b in digest {
        use std::fmt::Write;
        let _ = write!(out, "{b:02x}");
    }
    out
}

/// Stable content-derived identity. `ordinal` disambiguates byte-identical
/// candidates that also share kind and context (k-th occurrence in document
/// order); it is never a line number or array index.
pub fn derive_identity(source_text: &str, kind: &str, context: &Context, ordinal: usize) -> String {
    let name = format!(
        "{}::{}::{}::{}",
        normalize_ws(source_text),
        kind,
        fingerprint("", context),
        ordinal
    );
    Uuid::new_v5(&ENTRY_NAMESPACE, name.as_bytes()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(src: &str) -> Entry {
        Entry::new(src.to_string(), "Custom String".into(), Context::default())
    }

    #[test]
    fn translation_keeps_status_invariant() {
        let mut e = entry("Hello");
        assert_eq!(e.status, Status::Untranslated);

        e.set_translation("Bonjour");
        assert_eq!(e.status, Status::Translated);

        e.set_translation("");
        assert_eq!(e.status, Status::Untranslated);
        assert!(e.translated_text.is_empty());
    }

    #[test]
    fn reviewed_drops_back_on_edit() {
        let mut e = entry("Hello");
        e.set_translation("Bonjour");
        e.set_status(Status::Reviewed).unwrap();

        e.set_translation("Salut");
        assert_eq!(e.status, Status::Translated);
    }

    #[test]
    fn status_cannot_jump_to_translated_without_text() {
        let mut e = entry("Hello");
        assert!(e.set_status(Status::Translated).is_err());
        assert!(e.set_status(Status::Ignored).is_ok());
    }

    #[test]
    fn untranslated_cannot_go_reviewed() {
        let mut e = entry("Hello");
        e.set_translation("Bonjour");
        e.set_translation("");
        assert!(e.set_status(Status::Reviewed).is_err());
    }

    #[test]
    fn identity_ignores_position_but_not_content() {
        let ctx = Context {
            lines: vec!["a".into(), "b".into()],
            active_line: Some(1),
        };
        let a = derive_identity("Hello  world", "Custom String", &ctx, 0);
        let b = derive_identity("Hello world", "Custom String", &ctx, 0);
        assert_eq!(a, b, "whitespace runs are normalized away");

        let c = derive_identity("Hello world", "Description", &ctx, 0);
        assert_ne!(a, c, "kind is part of identity");

        let d = derive_identity("Hello world", "Custom String", &ctx, 1);
        assert_ne!(a, d, "occurrence ordinal disambiguates duplicates");
    }

    #[test]
    fn fingerprint_normalizes_context_whitespace() {
        let a = Context {
            lines: vec!["let x =  1;".into()],
            active_line: Some(0),
        };
        let b = Context {
            lines: vec!["let x = 1;".into()],
            active_line: Some(0),
        };
        assert_eq!(fingerprint("Hello", &a), fingerprint("Hello", &b));
        assert_ne!(fingerprint("Hello", &a), fingerprint("Hi", &a));
    }

    #[test]
    fn raw_translation_escapes() {
        let mut e = entry("x");
        e.set_translation("a\"b\\c\nd");
        assert_eq!(e.raw_translation(), "a\\\"b\\\\c\\nd");
    }
}
