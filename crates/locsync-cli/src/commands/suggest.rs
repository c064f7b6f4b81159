use color_eyre::eyre::{bail, Result};
use locsync_core::Status;
use locsync_services::{load_project, DisplayOrder, SuggestionEngine};
use locsync_tm::TmStore;
use std::path::PathBuf;

pub fn run_suggest(
    project: PathBuf,
    tm: PathBuf,
    id: Option<String>,
    limit: Option<usize>,
) -> Result<()> {
    tracing::debug!(event = "suggest_args", project = ?project, tm = ?tm, id = ?id);
    let cfg = locsync_config::load_config().unwrap_or_default();

    let store = load_project(&project)?.into_store();
    let memory = TmStore::load_jsonl(&tm)?;
    let mut engine = SuggestionEngine::new(super::match_policy(&cfg, limit));

    let targets: Vec<(String, String)> = match id {
        Some(id) => {
            let Some(entry) = store.get(&id) else {
                bail!("no entry with identity {id}");
            };
            vec![(entry.identity.clone(), entry.source_text.clone())]
        }
        None => store
            .display_entries(DisplayOrder::Position)
            .iter()
            .filter(|e| e.status == Status::Untranslated)
            .map(|e| (e.identity.clone(), e.source_text.clone()))
            .collect(),
    };

    for (identity, source) in targets {
        let suggestions = engine.suggest(&source, &memory);
        if suggestions.is_empty() {
            continue;
        }
        println!("{identity}  {source}");
        for s in suggestions {
            let pct = (s.score * 100.0).round() as u32;
            let tag = if s.exact { "=" } else { "~" };
            println!("  {tag} {pct:>3}%  {}", s.translated_text);
        }
    }
    Ok(())
}
