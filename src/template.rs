//! Category template: the desired output taxonomy, independent of which
//! sources actually carried a channel.
//!
//! File format: `#Category#` header lines followed by bare channel-name
//! lines. Channels missing from every source are still rendered downstream
//! as "no source" placeholders, never dropped.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use tracing::{debug, warn};

use crate::aliases::AliasTable;

#[derive(Debug, Clone, Default)]
pub struct Template {
    order: Vec<String>,
    categories: HashMap<String, Vec<String>>,
}

impl Template {
    /// Parse template text. Unattached channel lines (before any category
    /// header) are ignored with a warning.
    pub fn parse(text: &str) -> Template {
        let mut template = Template::default();
        let mut current: Option<String> = None;

        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('#') {
                let category = line.trim_matches('#').trim();
                if !category.is_empty() {
                    template.push_category(category);
                    current = Some(category.to_string());
                }
            } else if line.contains(',') {
                warn!("template line {} looks like an entry, ignoring: {line}", line_no + 1);
            } else if let Some(category) = &current {
                template.push_channel(category, line);
            } else {
                warn!("template line {} has no category header: {line}", line_no + 1);
            }
        }

        template
    }

    /// Load a template file, falling back to the built-in default when the
    /// path is absent or missing.
    pub fn load(path: Option<&Path>) -> Result<Template> {
        match path {
            Some(path) if path.exists() => {
                let contents = std::fs::read_to_string(path)?;
                let template = Template::parse(&contents);
                if template.is_empty() {
                    warn!("template file {} produced no categories, using default", path.display());
                    return Ok(Template::default_template());
                }
                Ok(template)
            }
            Some(path) => {
                debug!("template file {} not found, using default", path.display());
                Ok(Template::default_template())
            }
            None => Ok(Template::default_template()),
        }
    }

    pub fn default_template() -> Template {
        let mut template = Template::default();
        let defaults: &[(&str, &[&str])] = &[
            (
                "央视频道",
                &["CCTV-1 综合", "CCTV-2 财经", "CCTV-3 综艺", "CCTV-4 中文国际", "CCTV-5 体育"],
            ),
            (
                "卫视频道",
                &["湖南卫视", "浙江卫视", "东方卫视", "北京卫视", "江苏卫视"],
            ),
            ("其他频道", &["广东卫视", "深圳卫视", "山东卫视", "天津卫视"]),
        ];
        for (category, channels) in defaults {
            template.push_category(category);
            for channel in *channels {
                template.push_channel(category, channel);
            }
        }
        template
    }

    fn push_category(&mut self, category: &str) {
        if !self.categories.contains_key(category) {
            self.order.push(category.to_string());
            self.categories.insert(category.to_string(), Vec::new());
        }
    }

    fn push_channel(&mut self, category: &str, channel: &str) {
        if let Some(channels) = self.categories.get_mut(category) {
            channels.push(channel.to_string());
        }
    }

    /// Iterate categories in file order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.order.iter().filter_map(|name| {
            self.categories
                .get(name)
                .map(|channels| (name.as_str(), channels.as_slice()))
        })
    }

    /// Whether a source channel duplicates any template entry under the
    /// alias policy; used to keep it out of the catch-all bucket.
    pub fn covers(&self, aliases: &AliasTable, channel: &str) -> bool {
        self.iter()
            .flat_map(|(_, channels)| channels.iter())
            .any(|template_name| aliases.matches(template_name, channel))
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
