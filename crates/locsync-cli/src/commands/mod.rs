pub mod apply_tm;
pub mod export_po;
pub mod extract;
pub mod stats;
pub mod suggest;
pub mod update;
pub mod validate;

use color_eyre::eyre::{eyre, Result};
use locsync_config::LocSyncConfig;
use locsync_extract::{default_rules, Exclusion, ExtractPolicy, ExtractionRule};
use locsync_reconcile::ReconcilePolicy;
use locsync_tm::MatchPolicy;
use locsync_validate::ValidatePolicy;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct RulesFile {
    rules: Vec<ExtractionRule>,
}

/// Rules from `--rules`, or the built-in set. A config-level ignore pattern
/// is appended to every rule's exclusions.
pub(crate) fn load_rules(path: Option<&Path>, cfg: &LocSyncConfig) -> Result<Vec<ExtractionRule>> {
    let mut rules = match path {
        Some(p) => {
            let text = std::fs::read_to_string(p)
                .map_err(|e| eyre!("cannot read rules file {}: {e}", p.display()))?;
            let file: RulesFile = toml::from_str(&text)?;
            file.rules
        }
        None => default_rules(),
    };
    if let Some(pattern) = cfg.extract.as_ref().and_then(|e| e.ignore_regex.clone()) {
        for rule in &mut rules {
            rule.exclusions.push(Exclusion::IgnoreRegex {
                pattern: pattern.clone(),
            });
        }
    }
    Ok(rules)
}

pub(crate) fn extract_policy(cfg: &LocSyncConfig) -> ExtractPolicy {
    let mut policy = ExtractPolicy::default();
    if let Some(radius) = cfg.extract.as_ref().and_then(|e| e.context_radius) {
        policy.context_radius = radius;
    }
    policy
}

pub(crate) fn reconcile_policy(cfg: &LocSyncConfig, keep_removed: bool) -> ReconcilePolicy {
    let mut policy = ReconcilePolicy::default();
    if let Some(rec) = cfg.reconcile.as_ref() {
        if let Some(v) = rec.min_similarity {
            policy.min_similarity = v;
        }
        if let Some(v) = rec.ambiguity_margin {
            policy.ambiguity_margin = v;
        }
        if rec.keep_removed.unwrap_or(false) {
            policy.removed_policy = locsync_domain::RemovedPolicy::KeepIgnored;
        }
    }
    if keep_removed {
        policy.removed_policy = locsync_domain::RemovedPolicy::KeepIgnored;
    }
    policy
}

pub(crate) fn validate_policy(cfg: &LocSyncConfig) -> ValidatePolicy {
    let mut policy = ValidatePolicy::default();
    if let Some(val) = cfg.validate.as_ref() {
        if val.placeholder_pattern.is_some() {
            policy.placeholder_pattern = val.placeholder_pattern.clone();
        }
        if let Some(v) = val.line_tolerance {
            policy.line_tolerance = v;
        }
        if let Some(v) = val.minor_band {
            policy.minor_band = v;
        }
        if let Some(v) = val.major_band {
            policy.major_band = v;
        }
    }
    policy
}

pub(crate) fn match_policy(cfg: &LocSyncConfig, limit: Option<usize>) -> MatchPolicy {
    let mut policy = MatchPolicy::default();
    if let Some(tm) = cfg.tm.as_ref() {
        if let Some(v) = tm.min_similarity {
            policy.min_similarity = v;
        }
        if let Some(v) = tm.max_suggestions {
            policy.max_suggestions = v;
        }
    }
    if let Some(n) = limit {
        policy.max_suggestions = n;
    }
    policy
}

/// Language pair for a loaded project: project fields win, then config,
/// then plain defaults.
pub(crate) fn lang_pair(
    project_src: &str,
    project_tgt: &str,
    cfg: &LocSyncConfig,
) -> (String, String) {
    let src = if project_src.is_empty() {
        cfg.source_lang.clone().unwrap_or_else(|| "en".to_string())
    } else {
        project_src.to_string()
    };
    let tgt = if project_tgt.is_empty() {
        cfg.target_lang.clone().unwrap_or_else(|| "en".to_string())
    } else {
        project_tgt.to_string()
    };
    (src, tgt)
}
