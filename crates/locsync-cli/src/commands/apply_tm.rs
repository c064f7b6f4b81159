use color_eyre::eyre::Result;
use locsync_services::{apply_tm, load_project, save_project, ProjectFile};
use locsync_tm::TmStore;
use std::path::PathBuf;

pub fn run_apply_tm(project: PathBuf, tm: PathBuf) -> Result<()> {
    tracing::debug!(event = "apply_tm_args", project = ?project, tm = ?tm);

    let loaded = load_project(&project)?;
    let (src, tgt) = (loaded.source_lang.clone(), loaded.target_lang.clone());
    let mut store = loaded.into_store();

    let memory = TmStore::load_jsonl(&tm)?;
    let filled = apply_tm(&mut store, &memory);

    save_project(&project, &ProjectFile::new(&src, &tgt, &store))?;
    println!("✔ Filled {filled} entry(ies) from translation memory");
    Ok(())
}
