//! PO/POT bridge. The reader yields entries in exactly the shape the
//! extractor produces, so the reconciler operates identically whether
//! candidates came from regex extraction or from a PO template.

use color_eyre::eyre::{eyre, Result};
use locsync_core::{derive_identity, normalize_ws, Context, Entry, Status};
use std::collections::HashMap;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;

pub const PO_KIND: &str = "PO Import";

#[derive(Default)]
struct PoAccumulator {
    comments: Vec<String>,
    references: Vec<String>,
    fuzzy: bool,
    obsolete: bool,
    msgctxt: Option<String>,
    msgid: Option<String>,
    msgstr: Option<String>,
}

enum Field {
    None,
    Ctxt,
    Id,
    Str,
}

impl PoAccumulator {
    fn into_entry(self, seen: &mut HashMap<String, usize>) -> Option<Entry> {
        let msgid = self.msgid?;
        if msgid.is_empty() || self.obsolete {
            // Header or obsolete entry.
            return None;
        }
        let context = Context {
            lines: self.references.clone(),
            active_line: None,
        };
        let dup_key = format!("{}::{}", normalize_ws(&msgid), PO_KIND);
        let ordinal = {
            let slot = seen.entry(dup_key).or_insert(0);
            let n = *slot;
            *slot += 1;
            n
        };
        let mut entry = Entry::new(msgid, PO_KIND.to_string(), context);
        entry.identity = derive_identity(&entry.source_text, &entry.kind, &entry.context, ordinal);
        entry.comment = self.comments.join("\n");
        let msgstr = self.msgstr.unwrap_or_default();
        if !msgstr.is_empty() {
            entry.translated_text = msgstr;
            entry.status = if self.fuzzy {
                Status::Fuzzy
            } else {
                Status::Translated
            };
        }
        // msgctxt is display information only; identity comes from content.
        let _ = self.msgctxt;
        Some(entry)
    }
}

/// Parse a PO/POT stream into entries. Handles multiline strings, `#`/`#.`
/// comments, `#:` references and the `fuzzy` flag; the header entry and
/// obsolete (`#~`) entries are dropped.
pub fn read_po<R: BufRead>(reader: R) -> Result<Vec<Entry>> {
    let mut entries = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut acc = PoAccumulator::default();
    let mut field = Field::None;

    let mut flush =
        |acc: &mut PoAccumulator, seen: &mut HashMap<String, usize>, entries: &mut Vec<Entry>| {
            let done = std::mem::take(acc);
            if let Some(entry) = done.into_entry(seen) {
                entries.push(entry);
            }
        };

    for line in reader.lines() {
        let line = line?;
        let lt = line.trim();

        if lt.is_empty() {
            flush(&mut acc, &mut seen, &mut entries);
            field = Field::None;
            continue;
        }
        if let Some(rest) = lt.strip_prefix("#:") {
            acc.references.push(rest.trim().to_string());
            continue;
        }
        if let Some(rest) = lt.strip_prefix("#,") {
            if rest.split(',').any(|f| f.trim() == "fuzzy") {
                acc.fuzzy = true;
            }
            continue;
        }
        if lt.starts_with("#~") {
            acc.obsolete = true;
            continue;
        }
        if let Some(rest) = lt.strip_prefix("#.") {
            acc.comments.push(rest.trim().to_string());
            continue;
        }
        if let Some(rest) = lt.strip_prefix('#') {
            acc.comments.push(rest.trim().to_string());
            continue;
        }
        if let Some(rest) = lt.strip_prefix("msgctxt") {
            acc.msgctxt = Some(parse_po_string(rest)?);
            field = Field::Ctxt;
            continue;
        }
        if let Some(rest) = lt.strip_prefix("msgid") {
            acc.msgid = Some(parse_po_string(rest)?);
            field = Field::Id;
            continue;
        }
        if let Some(rest) = lt.strip_prefix("msgstr") {
            acc.msgstr = Some(parse_po_string(rest)?);
            field = Field::Str;
            continue;
        }
        if lt.starts_with('"') {
            let chunk = parse_po_string(lt)?;
            match field {
                Field::Ctxt => {
                    if let Some(s) = acc.msgctxt.as_mut() {
                        s.push_str(&chunk);
                    }
                }
                Field::Id => {
                    if let Some(s) = acc.msgid.as_mut() {
                        s.push_str(&chunk);
                    }
                }
                Field::Str => {
                    if let Some(s) = acc.msgstr.as_mut() {
                        s.push_str(&chunk);
                    }
                }
                Field::None => {}
            }
        }
    }
    flush(&mut acc, &mut seen, &mut entries);
    Ok(entries)
}

pub fn read_po_file(path: &Path) -> Result<Vec<Entry>> {
    let file = std::fs::File::open(path)?;
    read_po(std::io::BufReader::new(file))
}

fn parse_po_string(s: &str) -> Result<String> {
    let s = s.trim();
    if !s.starts_with('"') || !s.ends_with('"') || s.len() < 2 {
        return Err(eyre!("invalid po string: {s}"));
    }
    let inner = &s[1..s.len() - 1];
    let mut out = String::new();
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    Ok(out)
}

fn escape_po(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 8);
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out
}

/// Write entries as one PO file: header, `#` comments, `#:` references,
/// `#, fuzzy` flags, `msgctxt` = identity (unique, stable across edits).
pub fn write_po<W: Write>(writer: W, entries: &[Entry], lang: Option<&str>) -> Result<()> {
    let mut w = BufWriter::new(writer);

    writeln!(w, "msgid \"\"")?;
    writeln!(w, "msgstr \"\"")?;
    writeln!(w, "\"Project-Id-Version: locsync 0.3\\n\"")?;
    writeln!(w, "\"POT-Creation-Date: \\n\"")?;
    writeln!(w, "\"PO-Revision-Date: \\n\"")?;
    writeln!(w, "\"Last-Translator: \\n\"")?;
    writeln!(w, "\"Language-Team: \\n\"")?;
    writeln!(w, "\"Language: {}\\n\"", lang.unwrap_or(""))?;
    writeln!(w, "\"MIME-Version: 1.0\\n\"")?;
    writeln!(w, "\"Content-Type: text/plain; charset=UTF-8\\n\"")?;
    writeln!(w, "\"Content-Transfer-Encoding: 8bit\\n\"")?;
    writeln!(w)?;

    for entry in entries {
        for line in entry.comment.lines() {
            writeln!(w, "# {line}")?;
        }
        if entry.kind == PO_KIND {
            for reference in &entry.context.lines {
                writeln!(w, "#: {reference}")?;
            }
        } else if let Some(line) = entry.line {
            writeln!(w, "#: source:{line}")?;
        }
        if entry.status == Status::Fuzzy {
            writeln!(w, "#, fuzzy")?;
        }
        writeln!(w, "msgctxt \"{}\"", escape_po(&entry.identity))?;
        writeln!(w, "msgid \"{}\"", escape_po(&entry.source_text))?;
        writeln!(w, "msgstr \"{}\"", escape_po(&entry.translated_text))?;
        writeln!(w)?;
    }
    w.flush()?;
    Ok(())
}

pub fn write_po_file(path: &Path, entries: &[Entry], lang: Option<&str>) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_po(file, entries, lang)
}
