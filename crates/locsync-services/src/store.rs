use locsync_core::Entry;
use std::collections::HashMap;

/// Resortable display orders. Iteration itself always exposes insertion
/// order; display order is computed on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayOrder {
    /// Document position (entries without a position sort last), then identity.
    #[default]
    Position,
    /// Status group, then document position.
    Status,
    /// Source text, then identity.
    Source,
}

/// The authoritative in-memory entry collection for one project/file.
/// Plain data: matching and validation logic live in their own crates, and
/// the single-writer discipline is enforced by the caller.
#[derive(Debug, Default)]
pub struct EntryStore {
    entries: Vec<Entry>,
    by_identity: HashMap<String, usize>,
    by_fingerprint: HashMap<String, Vec<usize>>,
}

impl EntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<Entry>) -> Self {
        let mut store = Self::new();
        store.replace_all(entries);
        store
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insertion-order iteration.
    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn get(&self, identity: &str) -> Option<&Entry> {
        self.by_identity.get(identity).map(|&i| &self.entries[i])
    }

    pub fn get_mut(&mut self, identity: &str) -> Option<&mut Entry> {
        let i = *self.by_identity.get(identity)?;
        Some(&mut self.entries[i])
    }

    /// All entries sharing an origin fingerprint, in insertion order.
    pub fn by_fingerprint(&self, fingerprint: &str) -> Vec<&Entry> {
        self.by_fingerprint
            .get(fingerprint)
            .map(|ix| ix.iter().map(|&i| &self.entries[i]).collect())
            .unwrap_or_default()
    }

    /// Insert one entry. Identity must be unique within the store.
    pub fn insert(&mut self, entry: Entry) -> bool {
        if self.by_identity.contains_key(&entry.identity) {
            return false;
        }
        let i = self.entries.len();
        self.by_identity.insert(entry.identity.clone(), i);
        self.by_fingerprint
            .entry(entry.origin_fingerprint.clone())
            .or_default()
            .push(i);
        self.entries.push(entry);
        true
    }

    /// Bulk state swap, e.g. after reconciliation. Entries with duplicate
    /// identities beyond the first are dropped.
    pub fn replace_all(&mut self, entries: Vec<Entry>) {
        self.entries.clear();
        self.by_identity.clear();
        self.by_fingerprint.clear();
        for entry in entries {
            self.insert(entry);
        }
    }

    /// Apply `f` to the entry with this identity; true when it existed.
    pub fn update(&mut self, identity: &str, f: impl FnOnce(&mut Entry)) -> bool {
        match self.get_mut(identity) {
            Some(entry) => {
                f(entry);
                true
            }
            None => false,
        }
    }

    /// Indices into insertion order, resorted for display. The sort is
    /// stable so batch results merged back in this order are deterministic.
    pub fn display_indices(&self, order: DisplayOrder) -> Vec<usize> {
        let mut ix: Vec<usize> = (0..self.entries.len()).collect();
        match order {
            DisplayOrder::Position => ix.sort_by(|&a, &b| {
                let pa = self.entries[a].span.map(|s| s.0);
                let pb = self.entries[b].span.map(|s| s.0);
                match (pa, pb) {
                    (Some(x), Some(y)) => x
                        .cmp(&y)
                        .then_with(|| self.entries[a].identity.cmp(&self.entries[b].identity)),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => self.entries[a].identity.cmp(&self.entries[b].identity),
                }
            }),
            DisplayOrder::Status => ix.sort_by_key(|&i| {
                (
                    self.entries[i].status.as_str(),
                    self.entries[i].span.map(|s| s.0).unwrap_or(usize::MAX),
                )
            }),
            DisplayOrder::Source => ix.sort_by(|&a, &b| {
                self.entries[a]
                    .source_text
                    .cmp(&self.entries[b].source_text)
                    .then_with(|| self.entries[a].identity.cmp(&self.entries[b].identity))
            }),
        }
        ix
    }

    pub fn display_entries(&self, order: DisplayOrder) -> Vec<&Entry> {
        self.display_indices(order)
            .into_iter()
            .map(|i| &self.entries[i])
            .collect()
    }
}
