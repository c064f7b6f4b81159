use color_eyre::eyre::Result;
use locsync_domain::RemovedPolicy;
use locsync_services::{
    load_project, save_project, update_from_pot, update_from_source, EntryStore, ProjectFile,
    UpdateOutcome,
};
use std::path::PathBuf;

pub fn run_update(
    project: PathBuf,
    input: PathBuf,
    rules: Option<PathBuf>,
    keep_removed: bool,
) -> Result<()> {
    tracing::debug!(event = "update_args", project = ?project, input = ?input, keep_removed);
    let cfg = locsync_config::load_config().unwrap_or_default();

    let (src, tgt, mut store) = if project.exists() {
        let loaded = load_project(&project)?;
        let (src, tgt) = super::lang_pair(&loaded.source_lang, &loaded.target_lang, &cfg);
        (src, tgt, loaded.into_store())
    } else {
        tracing::info!(event = "project_created", path = %project.display());
        let (src, tgt) = super::lang_pair("", "", &cfg);
        (src, tgt, EntryStore::new())
    };

    let policy = super::reconcile_policy(&cfg, keep_removed);
    let is_po = matches!(
        input.extension().and_then(|e| e.to_str()),
        Some("po") | Some("pot")
    );
    let outcome: UpdateOutcome = if is_po {
        update_from_pot(&mut store, &input, &policy)?
    } else {
        let text = std::fs::read_to_string(&input)?;
        let rules = super::load_rules(rules.as_deref(), &cfg)?;
        update_from_source(
            &mut store,
            &text,
            &rules,
            &super::extract_policy(&cfg),
            &policy,
        )
    };

    let mut file = ProjectFile::new(&src, &tgt, &store);
    file.removed_policy = policy.removed_policy;
    save_project(&project, &file)?;

    let s = &outcome.summary;
    println!(
        "✔ Updated: {} exact, {} fuzzy, {} added, {} removed",
        s.exact, s.fuzzy, s.added, s.removed
    );
    if !outcome.ambiguities.is_empty() {
        println!("⚠ {} ambiguous fuzzy pairing(s); review entries marked fuzzy", outcome.ambiguities.len());
    }
    if s.removed > 0 && matches!(s.removed_policy, RemovedPolicy::KeepIgnored) {
        println!("  removed entries kept with status ignored");
    }
    Ok(())
}
