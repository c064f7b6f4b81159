use color_eyre::eyre::Result;
use locsync_services::{load_project, validate_all, CancelToken};
use locsync_validate::RatioBaselines;
use std::path::PathBuf;

pub fn run_validate(
    project: PathBuf,
    baselines: Option<PathBuf>,
    format: &str,
    use_color: bool,
) -> Result<()> {
    tracing::debug!(event = "validate_args", project = ?project, baselines = ?baselines);
    let cfg = locsync_config::load_config().unwrap_or_default();

    let loaded = load_project(&project)?;
    let (src, tgt) = super::lang_pair(&loaded.source_lang, &loaded.target_lang, &cfg);
    let mut store = loaded.into_store();

    let baselines_path = baselines.or_else(|| {
        cfg.validate
            .as_ref()
            .and_then(|v| v.baselines.clone())
            .map(PathBuf::from)
    });
    let ratios = match baselines_path {
        Some(p) => Some(RatioBaselines::load(&p)?),
        None => None,
    };

    let messages = validate_all(
        &mut store,
        ratios.as_ref(),
        &src,
        &tgt,
        &super::validate_policy(&cfg),
        &CancelToken::new(),
    );

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }

    if messages.is_empty() {
        println!("✔ No findings");
        return Ok(());
    }
    for m in &messages {
        if use_color {
            use owo_colors::OwoColorize;
            let kind = match m.severity.as_str() {
                "major" => format!("{}", m.kind.red()),
                _ => format!("{}", m.kind.yellow()),
            };
            println!("[{}] {} — {}", kind, m.identity.green(), m.message);
        } else {
            println!("[{}] {} — {}", m.kind, m.identity, m.message);
        }
    }
    println!("{} finding(s)", messages.len());
    Ok(())
}
