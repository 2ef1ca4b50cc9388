//! Channel name alias resolution.
//!
//! Raw channel names from sources rarely match the template spelling
//! exactly. Matching policy, first hit wins: exact equality, shared synonym
//! group in the alias table, then a normalized fuzzy comparison with known
//! suffix and noise tokens stripped.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use tracing::debug;

/// Suffix and noise tokens removed before fuzzy comparison. Comparison runs
/// on lowercased input, so only the lowercase latin token is listed.
const NOISE_TOKENS: &[&str] = &["卫视", "频道", "台", "tv", " ", "-", "—"];

/// Static canonical-name → synonym-set table, read-only during a run.
#[derive(Debug, Clone)]
pub struct AliasTable {
    groups: HashMap<String, Vec<String>>,
}

impl Default for AliasTable {
    fn default() -> Self {
        let mut groups = HashMap::new();
        let defaults: &[(&str, &[&str])] = &[
            ("CCTV1", &["CCTV-1", "CCTV-1 综合", "央视一套", "中央一套"]),
            ("CCTV2", &["CCTV-2", "CCTV-2 财经", "央视二套", "中央二套"]),
            ("CCTV3", &["CCTV-3", "CCTV-3 综艺", "央视三套", "中央三套"]),
            ("湖南卫视", &["湖南台", "芒果台", "Hunan TV"]),
            ("浙江卫视", &["浙江台", "Zhejiang TV"]),
            ("东方卫视", &["东方台", "Shanghai TV", "上海卫视"]),
        ];
        for (canonical, aliases) in defaults {
            groups.insert(
                canonical.to_string(),
                aliases.iter().map(|s| s.to_string()).collect(),
            );
        }
        Self { groups }
    }
}

impl AliasTable {
    /// Load a table from a TOML file mapping canonical names to synonym
    /// arrays; the built-in table is used when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) if path.exists() => {
                let contents = std::fs::read_to_string(path)?;
                let groups: HashMap<String, Vec<String>> = toml::from_str(&contents)?;
                Ok(Self { groups })
            }
            Some(path) => {
                debug!("alias file {} not found, using built-in table", path.display());
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    /// Whether a source channel name refers to the same channel as a template
    /// name.
    pub fn matches(&self, template_name: &str, candidate_name: &str) -> bool {
        if template_name == candidate_name {
            return true;
        }
        if self.same_group(template_name, candidate_name) {
            return true;
        }
        fuzzy_equal(template_name, candidate_name)
    }

    fn same_group(&self, a: &str, b: &str) -> bool {
        self.groups.iter().any(|(canonical, aliases)| {
            let member = |name: &str| canonical == name || aliases.iter().any(|alias| alias == name);
            member(a) && member(b)
        })
    }
}

/// Strip noise tokens and case-fold a channel name for fuzzy comparison.
fn normalize(name: &str) -> String {
    let mut normalized = name.to_lowercase();
    for token in NOISE_TOKENS {
        normalized = normalized.replace(token, "");
    }
    normalized
}

fn fuzzy_equal(a: &str, b: &str) -> bool {
    let a = normalize(a);
    let b = normalize(b);
    if a.is_empty() || b.is_empty() {
        // names made entirely of noise tokens must not match everything
        return a == b && !a.is_empty();
    }
    a == b || a.contains(&b) || b.contains(&a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_wins() {
        let table = AliasTable::default();
        assert!(table.matches("湖南卫视", "湖南卫视"));
    }

    #[test]
    fn alias_group_matches_both_directions() {
        let table = AliasTable::default();
        assert!(table.matches("湖南卫视", "湖南台"));
        assert!(table.matches("湖南台", "湖南卫视"));
        assert!(table.matches("芒果台", "湖南台"));
    }

    #[test]
    fn fuzzy_match_strips_suffixes() {
        let table = AliasTable::default();
        assert!(table.matches("浙江卫视", "浙江台"));
        assert!(table.matches("CCTV-5", "CCTV-5 体育"));
    }

    #[test]
    fn unrelated_channels_do_not_match() {
        let table = AliasTable::default();
        assert!(!table.matches("湖南卫视", "浙江卫视"));
        assert!(!table.matches("CCTV1", "凤凰资讯"));
    }

    #[test]
    fn pure_noise_names_never_match_everything() {
        let table = AliasTable::default();
        assert!(!table.matches("卫视", "湖南卫视"));
        assert!(!table.matches("卫视", "台"));
    }

    #[test]
    fn toml_table_overrides_builtin() {
        let table: HashMap<String, Vec<String>> =
            toml::from_str("\"江苏卫视\" = [\"江苏台\"]\n").unwrap();
        let table = AliasTable { groups: table };
        assert!(table.matches("江苏卫视", "江苏台"));
        // the built-in 湖南 group is gone, but fuzzy matching still applies
        assert!(table.matches("湖南卫视", "湖南台"));
        assert!(!table.matches("芒果台", "湖南卫视"));
    }
}
