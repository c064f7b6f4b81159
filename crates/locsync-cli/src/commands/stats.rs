use color_eyre::eyre::Result;
use locsync_services::{load_project, stats};
use std::path::PathBuf;

pub fn run_stats(project: PathBuf, format: &str) -> Result<()> {
    tracing::debug!(event = "stats_args", project = ?project);

    let store = load_project(&project)?.into_store();
    let s = stats(&store);

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&s)?);
        return Ok(());
    }
    println!("total         {}", s.total);
    println!("untranslated  {}", s.untranslated);
    println!("translated    {}", s.translated);
    println!("fuzzy         {}", s.fuzzy);
    println!("reviewed      {}", s.reviewed);
    println!("ignored       {}", s.ignored);
    let done = s.translated + s.reviewed;
    let countable = s.total.saturating_sub(s.ignored);
    if countable > 0 {
        println!("progress      {:.1}%", 100.0 * done as f64 / countable as f64);
    }
    Ok(())
}
