//! Length-baseline resource: expected expansion ratios per language pair,
//! derived offline from a reference parallel corpus. Loaded externally and
//! only consumed here.

use locsync_core::Result;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatioEntry {
    pub mean: f64,
    /// Statistical spread of the corpus ratios; 0 means unknown.
    #[serde(default)]
    pub spread: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RatioBaselines {
    #[serde(default)]
    ratios: HashMap<String, RatioEntry>,
}

fn canon(lang: &str) -> &str {
    // Traditional Chinese shares the corpus entry with zh.
    if lang == "zh_TW" || lang == "zh-TW" {
        "zh"
    } else {
        lang
    }
}

impl RatioBaselines {
    pub fn load(path: &Path) -> Result<RatioBaselines> {
        let file = std::fs::File::open(path)?;
        let baselines = serde_json::from_reader(file)?;
        Ok(baselines)
    }

    pub fn from_ratios(ratios: HashMap<String, RatioEntry>) -> Self {
        RatioBaselines { ratios }
    }

    pub fn is_empty(&self) -> bool {
        self.ratios.is_empty()
    }

    /// Expected ratio for (source, target). Falls back to the inverted pair
    /// and then to pivoting through English; `None` when nothing applies.
    pub fn expected(&self, source_lang: &str, target_lang: &str) -> Option<RatioEntry> {
        let mut visited = HashSet::new();
        self.lookup(canon(source_lang), canon(target_lang), &mut visited)
    }

    fn lookup(&self, src: &str, tgt: &str, visited: &mut HashSet<String>) -> Option<RatioEntry> {
        if self.ratios.is_empty() {
            return None;
        }
        if src == tgt {
            return Some(RatioEntry {
                mean: 1.0,
                spread: 0.0,
            });
        }
        let pair = format!("{src}-{tgt}");
        if !visited.insert(pair.clone()) {
            return None;
        }
        if let Some(&entry) = self.ratios.get(&pair) {
            return Some(entry);
        }
        if let Some(&rev) = self.ratios.get(&format!("{tgt}-{src}")) {
            if rev.mean != 0.0 {
                // Inverted mean; relative spread preserved.
                let mean = 1.0 / rev.mean;
                return Some(RatioEntry {
                    mean,
                    spread: (rev.spread / rev.mean) * mean,
                });
            }
        }
        if src != "en" && tgt != "en" {
            let to_en = self.lookup(src, "en", visited)?;
            let from_en = self.lookup("en", tgt, visited)?;
            let mean = to_en.mean * from_en.mean;
            let rel = (to_en.spread / to_en.mean.max(f64::MIN_POSITIVE))
                .max(from_en.spread / from_en.mean.max(f64::MIN_POSITIVE));
            return Some(RatioEntry {
                mean,
                spread: rel * mean,
            });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RatioBaselines {
        let mut ratios = HashMap::new();
        ratios.insert(
            "en-fr".to_string(),
            RatioEntry {
                mean: 1.1,
                spread: 0.2,
            },
        );
        ratios.insert(
            "de-en".to_string(),
            RatioEntry {
                mean: 0.8,
                spread: 0.1,
            },
        );
        RatioBaselines::from_ratios(ratios)
    }

    #[test]
    fn direct_lookup() {
        let e = table().expected("en", "fr").unwrap();
        assert_eq!(e.mean, 1.1);
    }

    #[test]
    fn reverse_pair_inverts() {
        let e = table().expected("fr", "en").unwrap();
        assert!((e.mean - 1.0 / 1.1).abs() < 1e-9);
    }

    #[test]
    fn same_language_is_unity() {
        let e = table().expected("en", "en").unwrap();
        assert_eq!(e.mean, 1.0);
    }

    #[test]
    fn pivots_through_english() {
        // de -> en (0.8) then en -> fr (1.1).
        let e = table().expected("de", "fr").unwrap();
        assert!((e.mean - 0.8 * 1.1).abs() < 1e-9);
    }

    #[test]
    fn unknown_pair_is_none() {
        assert!(table().expected("ja", "ko").is_none());
        assert!(RatioBaselines::default().expected("en", "fr").is_none());
    }

    #[test]
    fn zh_tw_aliases_zh() {
        let mut ratios = HashMap::new();
        ratios.insert(
            "en-zh".to_string(),
            RatioEntry {
                mean: 0.6,
                spread: 0.15,
            },
        );
        let t = RatioBaselines::from_ratios(ratios);
        assert_eq!(t.expected("en", "zh_TW").unwrap().mean, 0.6);
    }

    #[test]
    fn loads_from_json() {
        let dir = std::env::temp_dir().join("locsync-baseline-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("ratios.json");
        std::fs::write(
            &path,
            r#"{"ratios":{"en-ja":{"mean":0.5,"spread":0.12}}}"#,
        )
        .unwrap();
        let t = RatioBaselines::load(&path).unwrap();
        assert_eq!(t.expected("en", "ja").unwrap().mean, 0.5);
        let _ = std::fs::remove_file(&path);
    }
}
