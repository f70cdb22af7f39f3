/// Domain grouping engine: maps a tab URL to a named, colored group
use std::sync::LazyLock;

use log::debug;
use regex::Regex;
use url::Url;
use uuid::Uuid;

use crate::clock::now_millis;
use crate::config::{DomainInfo, GroupingConfig};
use crate::tab_data::{Group, NewEntry};

/// Key shared by every URL that cannot be parsed
pub const OTHER_KEY: &str = "other";

static TLD_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(com|org|net|io|dev|app|co|me|tv)$").expect("valid TLD suffix pattern")
});

static WORD_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.\-_]").expect("valid separator pattern"));

/// Picks (or creates) the group a new entry belongs to.
///
/// `groups` is the batch accumulator: a group created for one entry must be
/// visible to every later entry of the same batch, so implementations push
/// new groups into it rather than returning detached values.
pub trait GroupResolver {
    fn resolve<'g>(&self, entry: &NewEntry, groups: &'g mut Vec<Group>) -> &'g mut Group;
}

pub struct GroupingEngine {
    config: GroupingConfig,
}

impl GroupingEngine {
    pub fn new(config: GroupingConfig) -> GroupingEngine {
        GroupingEngine { config }
    }

    /// Extract the classification key from a URL.
    ///
    /// Algorithm:
    /// 1. Parse the URL; unparsable URLs map to `"other"`. URLs that parse
    ///    without a host (`file:///notes.html`, `mailto:`) have an empty
    ///    hostname and end up under the empty key
    /// 2. Strip a leading `www.`
    /// 3. If the hostname itself is curated, return it (keeps
    ///    `docs.google.com` apart from `mail.google.com`)
    /// 4. Else return the last two labels (`api.zinfandel.io` → `zinfandel.io`)
    ///
    /// The two-label rule ignores multi-part public suffixes, so
    /// `news.bbc.co.uk` → `co.uk`.
    pub fn domain_key(&self, url: &str) -> String {
        let hostname = match Url::parse(url) {
            Ok(parsed) => parsed.host_str().unwrap_or_default().to_lowercase(),
            Err(_) => return OTHER_KEY.to_string(),
        };

        let stripped = hostname.strip_prefix("www.").unwrap_or(&hostname);
        let map = &self.config.domain_map;

        if map.contains_key(stripped) {
            return stripped.to_string();
        }
        if map.contains_key(&hostname) {
            return hostname;
        }

        let parts: Vec<&str> = stripped.split('.').collect();
        if parts.len() < 2 {
            return stripped.to_string();
        }

        parts[parts.len() - 2..].join(".")
    }

    /// Name and color for a domain key: curated when known, otherwise a
    /// prettified name and a palette color picked by hash.
    pub fn group_identity(&self, key: &str) -> DomainInfo {
        if let Some(info) = self.config.domain_map.get(key) {
            return info.clone();
        }

        let palette = &self.config.palette;
        let color = if palette.is_empty() {
            String::new()
        } else {
            palette[hash_key(key) as usize % palette.len()].clone()
        };

        DomainInfo {
            name: prettify_domain(key),
            color,
        }
    }
}

impl GroupResolver for GroupingEngine {
    fn resolve<'g>(&self, entry: &NewEntry, groups: &'g mut Vec<Group>) -> &'g mut Group {
        let key = self.domain_key(&entry.url);

        // Existing groups win unchanged so user renames and recolors stick
        if let Some(index) = groups.iter().position(|g| g.domain == key) {
            return &mut groups[index];
        }

        let identity = self.group_identity(&key);
        debug!("New group '{}' for domain {}", identity.name, key);

        groups.push(Group {
            id: Uuid::new_v4().to_string(),
            name: identity.name,
            domain: key,
            color: identity.color,
            created_at: now_millis(),
            is_auto_generated: true,
            tabs: Vec::new(),
        });
        let index = groups.len() - 1;
        &mut groups[index]
    }
}

/// Turn a raw domain into a display name.
///
/// Examples:
/// - `my-cool-blog.dev` → `My Cool Blog`
/// - `my-blog.netlify.app` → `My Blog Netlify`
/// - `example.co.uk` → `Example Co Uk`
pub fn prettify_domain(domain: &str) -> String {
    let without_tld = TLD_SUFFIX.replace(domain, "");

    WORD_SEPARATOR
        .split(&without_tld)
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Rolling `h * 31 + c` hash over UTF-16 code units with 32-bit wrapping.
///
/// Matches the browser-side script bit for bit, so a domain keeps the same
/// fallback color whichever side created its group.
pub fn hash_key(key: &str) -> u32 {
    let mut hash: i32 = 0;
    for unit in key.encode_utf16() {
        hash = (hash << 5).wrapping_sub(hash).wrapping_add(i32::from(unit));
    }
    hash.unsigned_abs()
}
