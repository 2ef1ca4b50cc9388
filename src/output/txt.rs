//! Flat `name,url` listing grouped by the category template.
//!
//! Template entries with no surviving source become commented placeholder
//! lines, and category headers are always emitted. Ranked channels that
//! match no template entry are appended under a catch-all category.

use chrono::{DateTime, Utc};

use crate::aliases::AliasTable;
use crate::models::RankedChannelSet;
use crate::template::Template;

/// URLs emitted per template entry.
const URLS_PER_ENTRY: usize = 2;

const CATCH_ALL_CATEGORY: &str = "其他频道";

pub fn render(
    ranked: &RankedChannelSet,
    template: &Template,
    aliases: &AliasTable,
    generated_at: DateTime<Utc>,
) -> String {
    let mut out = Vec::new();
    out.push(format!(
        "# Generated at: {}",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    ));
    out.push(format!("# Channels: {}", ranked.channel_count()));
    out.push(format!("# URLs: {}", ranked.url_count()));
    out.push(String::new());

    for (category, template_channels) in template.iter() {
        out.push(format!("#{category}#"));
        for template_name in template_channels {
            let urls = resolve_urls(ranked, aliases, template_name);
            if urls.is_empty() {
                out.push(format!("#{template_name},no source"));
            } else {
                for url in urls {
                    out.push(format!("{template_name},{url}"));
                }
            }
        }
        out.push(String::new());
    }

    // valid channels covered by no template entry
    let mut uncategorized: Vec<(&str, &str)> = ranked
        .iter()
        .filter(|(_, urls)| !urls.is_empty())
        .filter(|(name, _)| !template.covers(aliases, name))
        .map(|(name, urls)| (name, urls[0].as_str()))
        .collect();
    uncategorized.sort_by_key(|(name, _)| name.to_string());

    if !uncategorized.is_empty() {
        out.push(format!("#{CATCH_ALL_CATEGORY}#"));
        for (name, url) in uncategorized {
            out.push(format!("{name},{url}"));
        }
        out.push(String::new());
    }

    out.join("\n")
}

/// Collect up to [`URLS_PER_ENTRY`] URLs for a template entry across all
/// ranked channels that the alias policy maps onto it.
fn resolve_urls<'a>(
    ranked: &'a RankedChannelSet,
    aliases: &AliasTable,
    template_name: &str,
) -> Vec<&'a str> {
    let mut urls = Vec::new();
    for (channel, channel_urls) in ranked.iter() {
        if !aliases.matches(template_name, channel) {
            continue;
        }
        for url in channel_urls {
            urls.push(url.as_str());
            if urls.len() >= URLS_PER_ENTRY {
                return urls;
            }
        }
    }
    urls
}
