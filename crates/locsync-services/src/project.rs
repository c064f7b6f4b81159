use crate::store::EntryStore;
use locsync_core::{Entry, Result};
use locsync_domain::{RemovedPolicy, SCHEMA_VERSION};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Serialized project shape. Saving then loading reproduces identity,
/// source text, translation, status, comment and context for every entry.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProjectFile {
    pub schema_version: u32,
    #[serde(default)]
    pub source_lang: String,
    #[serde(default)]
    pub target_lang: String,
    #[serde(default)]
    pub removed_policy: RemovedPolicy,
    pub entries: Vec<Entry>,
}

impl ProjectFile {
    pub fn new(source_lang: &str, target_lang: &str, store: &EntryStore) -> Self {
        ProjectFile {
            schema_version: SCHEMA_VERSION,
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            removed_policy: RemovedPolicy::default(),
            entries: store.iter().cloned().collect(),
        }
    }

    pub fn into_store(self) -> EntryStore {
        EntryStore::from_entries(self.entries)
    }
}

/// Atomic save: write to a temp sibling, then rename into place.
pub fn save_project(path: &Path, project: &ProjectFile) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    {
        let file = std::fs::File::create(&tmp)?;
        serde_json::to_writer_pretty(file, project)?;
    }
    std::fs::rename(&tmp, path)?;
    tracing::info!(event = "project_saved", path = %path.display(), entries = project.entries.len());
    Ok(())
}

pub fn load_project(path: &Path) -> Result<ProjectFile> {
    let file = std::fs::File::open(path)?;
    let project: ProjectFile = serde_json::from_reader(std::io::BufReader::new(file))?;
    Ok(project)
}
