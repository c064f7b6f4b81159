use serde::Deserialize;

/// File-level configuration. Every field is optional; engines have their own
/// policy defaults and callers overlay whatever is set here. Thresholds are
/// passed explicitly into engine calls, never read as ambient globals.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocSyncConfig {
    pub source_lang: Option<String>,
    pub target_lang: Option<String>,
    pub extract: Option<ExtractCfg>,
    pub reconcile: Option<ReconcileCfg>,
    pub tm: Option<TmCfg>,
    pub validate: Option<ValidateCfg>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractCfg {
    /// Lines of surrounding source kept on each side of an entry.
    pub context_radius: Option<usize>,
    /// Candidates matching this regex are discarded.
    pub ignore_regex: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReconcileCfg {
    /// Minimum source similarity for a fuzzy pairing (0..1).
    pub min_similarity: Option<f64>,
    /// Top-two score gap below which an ambiguity event is recorded.
    pub ambiguity_margin: Option<f64>,
    /// Keep removed entries tagged ignored instead of dropping them.
    pub keep_removed: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TmCfg {
    pub min_similarity: Option<f64>,
    pub max_suggestions: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ValidateCfg {
    /// Override for the placeholder token pattern.
    pub placeholder_pattern: Option<String>,
    /// Allowed difference in line-break counts.
    pub line_tolerance: Option<usize>,
    /// Expansion-ratio multipliers: beyond major ⇒ major finding.
    pub major_band: Option<f64>,
    pub minor_band: Option<f64>,
    /// Path to the length-baseline JSON resource.
    pub baselines: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("{0}")]
    Other(String),
}

/// Search order: CWD/locsync.toml, then $CONFIG_DIR/locsync/locsync.toml.
/// Later layers only fill fields the earlier ones left unset.
pub fn load_config() -> Result<LocSyncConfig, ConfigError> {
    let mut merged = LocSyncConfig::default();
    if let Ok(p) = std::env::current_dir() {
        merged = merge_file(merged, &p.join("locsync.toml"));
    }
    if let Some(base) = dirs::config_dir() {
        merged = merge_file(merged, &base.join("locsync").join("locsync.toml"));
    }
    Ok(merged)
}

fn merge_file(merged: LocSyncConfig, path: &std::path::Path) -> LocSyncConfig {
    if let Ok(s) = std::fs::read_to_string(path) {
        if let Ok(cfg) = toml::from_str::<LocSyncConfig>(&s) {
            return merge(merged, cfg);
        }
    }
    merged
}

fn merge(base: LocSyncConfig, over: LocSyncConfig) -> LocSyncConfig {
    LocSyncConfig {
        source_lang: base.source_lang.or(over.source_lang),
        target_lang: base.target_lang.or(over.target_lang),
        extract: merge_opt(base.extract, over.extract, |b, o| ExtractCfg {
            context_radius: b.context_radius.or(o.context_radius),
            ignore_regex: b.ignore_regex.or(o.ignore_regex),
        }),
        reconcile: merge_opt(base.reconcile, over.reconcile, |b, o| ReconcileCfg {
            min_similarity: b.min_similarity.or(o.min_similarity),
            ambiguity_margin: b.ambiguity_margin.or(o.ambiguity_margin),
            keep_removed: b.keep_removed.or(o.keep_removed),
        }),
        tm: merge_opt(base.tm, over.tm, |b, o| TmCfg {
            min_similarity: b.min_similarity.or(o.min_similarity),
            max_suggestions: b.max_suggestions.or(o.max_suggestions),
        }),
        validate: merge_opt(base.validate, over.validate, |b, o| ValidateCfg {
            placeholder_pattern: b.placeholder_pattern.or(o.placeholder_pattern),
            line_tolerance: b.line_tolerance.or(o.line_tolerance),
            major_band: b.major_band.or(o.major_band),
            minor_band: b.minor_band.or(o.minor_band),
            baselines: b.baselines.or(o.baselines),
        }),
    }
}

fn merge_opt<T>(base: Option<T>, over: Option<T>, f: impl FnOnce(T, T) -> T) -> Option<T> {
    match (base, over) {
        (Some(b), Some(o)) => Some(f(b, o)),
        (Some(b), None) => Some(b),
        (None, o) => o,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn earlier_layer_wins() {
        let base: LocSyncConfig = toml::from_str(
            r#"
            source_lang = "en"
            [reconcile]
            min_similarity = 0.7
            "#,
        )
        .unwrap();
        let over: LocSyncConfig = toml::from_str(
            r#"
            source_lang = "de"
            target_lang = "fr"
            [reconcile]
            min_similarity = 0.5
            keep_removed = true
            "#,
        )
        .unwrap();
        let merged = merge(base, over);
        assert_eq!(merged.source_lang.as_deref(), Some("en"));
        assert_eq!(merged.target_lang.as_deref(), Some("fr"));
        let rec = merged.reconcile.unwrap();
        assert_eq!(rec.min_similarity, Some(0.7));
        assert_eq!(rec.keep_removed, Some(true));
    }
}
