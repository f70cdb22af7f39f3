/// Configuration tables injected into the grouping engine and orchestrator
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShelfError};

/// Curated display identity for a well-known domain
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DomainInfo {
    pub name: String,
    pub color: String,
}

/// Hostname (or root domain) → curated name and brand color.
pub type DomainMap = HashMap<String, DomainInfo>;

const CURATED_DOMAINS: &[(&str, &str, &str)] = &[
    ("github.com", "GitHub", "#24292F"),
    ("gitlab.com", "GitLab", "#FC6D26"),
    ("bitbucket.org", "Bitbucket", "#0052CC"),
    ("stackoverflow.com", "Stack Overflow", "#F48024"),
    ("reddit.com", "Reddit", "#FF4500"),
    ("twitter.com", "Twitter / X", "#1DA1F2"),
    ("x.com", "Twitter / X", "#1DA1F2"),
    ("youtube.com", "YouTube", "#FF0000"),
    ("linkedin.com", "LinkedIn", "#0A66C2"),
    ("facebook.com", "Facebook", "#1877F2"),
    ("instagram.com", "Instagram", "#E4405F"),
    ("wikipedia.org", "Wikipedia", "#000000"),
    ("medium.com", "Medium", "#000000"),
    ("dev.to", "DEV Community", "#0A0A0A"),
    ("notion.so", "Notion", "#000000"),
    ("figma.com", "Figma", "#F24E1E"),
    ("dribbble.com", "Dribbble", "#EA4C89"),
    ("amazon.com", "Amazon", "#FF9900"),
    ("netflix.com", "Netflix", "#E50914"),
    ("spotify.com", "Spotify", "#1DB954"),
    ("slack.com", "Slack", "#4A154B"),
    ("discord.com", "Discord", "#5865F2"),
    ("twitch.tv", "Twitch", "#9146FF"),
    ("npmjs.com", "npm", "#CB3837"),
    ("vercel.com", "Vercel", "#000000"),
    ("netlify.com", "Netlify", "#00C7B7"),
    ("aws.amazon.com", "AWS", "#FF9900"),
    ("console.cloud.google.com", "Google Cloud", "#4285F4"),
    ("portal.azure.com", "Azure", "#0078D4"),
    // Google sub-services are keyed by full hostname
    ("docs.google.com", "Google Docs", "#4285F4"),
    ("sheets.google.com", "Google Sheets", "#0F9D58"),
    ("slides.google.com", "Google Slides", "#F4B400"),
    ("drive.google.com", "Google Drive", "#4285F4"),
    ("mail.google.com", "Gmail", "#EA4335"),
    ("calendar.google.com", "Google Calendar", "#4285F4"),
    ("meet.google.com", "Google Meet", "#00897B"),
    ("maps.google.com", "Google Maps", "#34A853"),
    ("translate.google.com", "Google Translate", "#4285F4"),
    ("google.com", "Google Search", "#4285F4"),
    ("www.google.com", "Google Search", "#4285F4"),
];

const FALLBACK_PALETTE: &[&str] = &[
    "#6366F1", "#8B5CF6", "#EC4899", "#F43F5E", "#F97316", "#EAB308", "#22C55E", "#14B8A6",
    "#06B6D4", "#3B82F6", "#A855F7", "#D946EF",
];

const BLOCKED_PREFIXES: &[&str] = &[
    "chrome://",
    "chrome-extension://",
    "about:",
    "edge://",
    "brave://",
    "devtools://",
];

pub fn default_domain_map() -> DomainMap {
    CURATED_DOMAINS
        .iter()
        .map(|(domain, name, color)| {
            (
                domain.to_string(),
                DomainInfo {
                    name: name.to_string(),
                    color: color.to_string(),
                },
            )
        })
        .collect()
}

/// Tables used by the grouping engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GroupingConfig {
    pub domain_map: DomainMap,
    /// Colors for domains missing from the map, picked by hash
    pub palette: Vec<String>,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        GroupingConfig {
            domain_map: default_domain_map(),
            palette: FALLBACK_PALETTE.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Top-level configuration for the shelf
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShelfConfig {
    pub grouping: GroupingConfig,
    /// URL prefixes of pages that can never be restored and are never saved
    pub blocked_prefixes: Vec<String>,
    pub max_sessions: usize,
    /// Opened before closing a window's last tabs
    pub new_tab_url: String,
    pub badge_color: String,
}

impl Default for ShelfConfig {
    fn default() -> Self {
        ShelfConfig {
            grouping: GroupingConfig::default(),
            blocked_prefixes: BLOCKED_PREFIXES.iter().map(|p| p.to_string()).collect(),
            max_sessions: 50,
            new_tab_url: "chrome://newtab".to_string(),
            badge_color: "#6366F1".to_string(),
        }
    }
}

impl ShelfConfig {
    /// Parse a JSON config; omitted fields keep their defaults.
    pub fn from_json(text: &str) -> Result<ShelfConfig> {
        let config: ShelfConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.grouping.palette.is_empty() {
            return Err(ShelfError::config("fallback palette must not be empty"));
        }
        if self.max_sessions == 0 {
            return Err(ShelfError::config("max_sessions must be at least 1"));
        }
        if self.new_tab_url.is_empty() {
            return Err(ShelfError::config("new_tab_url must not be empty"));
        }
        Ok(())
    }

    pub fn is_blocked(&self, url: &str) -> bool {
        self.blocked_prefixes
            .iter()
            .any(|prefix| url.starts_with(prefix.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ShelfConfig::default();
        assert_eq!(config.max_sessions, 50);
        assert_eq!(config.grouping.palette.len(), 12);
        assert_eq!(config.grouping.domain_map["docs.google.com"].name, "Google Docs");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_keeps_defaults_for_missing_fields() {
        let config = ShelfConfig::from_json(r#"{"max_sessions": 10}"#).unwrap();
        assert_eq!(config.max_sessions, 10);
        assert_eq!(config.new_tab_url, "chrome://newtab");
        assert!(config.grouping.domain_map.contains_key("github.com"));
    }

    #[test]
    fn test_from_json_rejects_empty_palette() {
        let result = ShelfConfig::from_json(r#"{"grouping": {"palette": []}}"#);
        assert!(matches!(result, Err(ShelfError::Config(_))));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            ShelfConfig::from_json("not json"),
            Err(ShelfError::Serialization(_))
        ));
    }

    #[test]
    fn test_is_blocked() {
        let config = ShelfConfig::default();
        assert!(config.is_blocked("chrome://settings"));
        assert!(config.is_blocked("chrome-extension://abc/dashboard.html"));
        assert!(config.is_blocked("about:blank"));
        assert!(config.is_blocked("devtools://devtools/bundled/inspector.html"));
        assert!(!config.is_blocked("https://example.org"));
    }
}
