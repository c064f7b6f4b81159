use color_eyre::eyre::Result;
use locsync_extract::extract;
use locsync_services::{export_csv, save_project, EntryStore, ProjectFile};
use std::path::PathBuf;

pub fn run_extract(
    input: PathBuf,
    rules: Option<PathBuf>,
    out_json: Option<PathBuf>,
    out_csv: Option<PathBuf>,
    out_pot: Option<PathBuf>,
) -> Result<()> {
    tracing::debug!(event = "extract_args", input = ?input, rules = ?rules);
    let cfg = locsync_config::load_config().unwrap_or_default();
    let rules = super::load_rules(rules.as_deref(), &cfg)?;

    let text = std::fs::read_to_string(&input)?;
    let outcome = extract(&text, &rules, &super::extract_policy(&cfg));
    if !outcome.skipped_rules.is_empty() {
        eprintln!("⚠ {} rule(s) skipped (bad pattern)", outcome.skipped_rules.len());
    }
    let store = EntryStore::from_entries(outcome.entries);
    println!("✔ Extracted {} entries from {}", store.len(), input.display());

    let (src, tgt) = super::lang_pair("", "", &cfg);
    if let Some(path) = out_json {
        let project = ProjectFile::new(&src, &tgt, &store);
        save_project(&path, &project)?;
        println!("✔ Project saved to {}", path.display());
    } else if let Some(path) = out_csv {
        let file = std::fs::File::create(&path)?;
        export_csv(file, &store)?;
        println!("✔ CSV saved to {}", path.display());
    } else if let Some(path) = out_pot {
        locsync_po::write_po_file(&path, store.entries(), None)?;
        println!("✔ POT saved to {}", path.display());
    } else {
        let stdout = std::io::stdout();
        export_csv(stdout.lock(), &store)?;
    }
    Ok(())
}
