use color_eyre::eyre::Result;
use locsync_services::load_project;
use std::path::PathBuf;

pub fn run_export_po(project: PathBuf, out: PathBuf, lang: Option<String>) -> Result<()> {
    tracing::debug!(event = "export_po_args", project = ?project, out = ?out, lang = ?lang);
    let cfg = locsync_config::load_config().unwrap_or_default();

    let loaded = load_project(&project)?;
    let (_, tgt) = super::lang_pair(&loaded.source_lang, &loaded.target_lang, &cfg);
    let lang = lang.unwrap_or(tgt);
    let store = loaded.into_store();

    locsync_po::write_po_file(&out, store.entries(), Some(&lang))?;
    println!("✔ PO saved to {}", out.display());
    Ok(())
}
