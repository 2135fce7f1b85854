use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::category::{CATEGORY_NAMESPACE_ALIASES, CategoryNamespace, DEFAULT_CATEGORY_NAMESPACE};
use crate::mutation::{InfoboxRules, RetargetRules, UnsourcedRules};
use crate::policy::DraftMarkers;
use crate::presets;

pub const DEFAULT_CONFIG_FILE: &str = "wikibot.toml";
pub const DEFAULT_API_URL: &str = "https://tr.wikipedia.org/w/api.php";
pub const DEFAULT_USER_AGENT: &str = "wikibot/0.2";
pub const DEFAULT_ARTICLE_PATH: &str = "/wiki/$1";
pub const DEFAULT_SOURCE_API_URL: &str = "https://en.wikipedia.org/w/api.php";
pub const DEFAULT_WIKIDATA_API_URL: &str = "https://www.wikidata.org/w/api.php";
pub const DEFAULT_SOURCE_SITE: &str = "enwiki";
pub const DEFAULT_TARGET_SITE: &str = "trwiki";
pub const DEFAULT_EDIT_DELAY_MS: u64 = 1_500;

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct WikiConfig {
    #[serde(default)]
    pub wiki: WikiSection,
    #[serde(default)]
    pub auth: AuthSection,
    #[serde(default)]
    pub crosswiki: CrosswikiSection,
    #[serde(default)]
    pub infobox: InfoboxSection,
    #[serde(default)]
    pub pacing: PacingSection,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct WikiSection {
    pub url: Option<String>,
    pub api_url: Option<String>,
    pub article_path: Option<String>,
    pub user_agent: Option<String>,
    pub category_namespace: Option<String>,
    #[serde(default)]
    pub draft_prefixes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct AuthSection {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct CrosswikiSection {
    pub source_api_url: Option<String>,
    pub wikidata_api_url: Option<String>,
    pub source_site: Option<String>,
    pub target_site: Option<String>,
}

/// Overrides for the football infobox rule tables. Empty lists keep the
/// built-in tables.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct InfoboxSection {
    #[serde(default)]
    pub templates: Vec<String>,
    #[serde(default)]
    pub rename: Vec<RenameEntry>,
    #[serde(default)]
    pub delete: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RenameEntry {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct PacingSection {
    pub edit_delay_ms: Option<u64>,
}

/// Credentials resolved from env or config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl WikiConfig {
    /// Resolve the wiki API URL: env WIKI_API_URL > config > Turkish Wikipedia.
    pub fn api_url(&self) -> String {
        env_or("WIKI_API_URL", self.wiki.api_url.as_deref(), DEFAULT_API_URL)
    }

    /// Resolve the wiki base URL: env WIKI_URL > config > derived from api_url.
    pub fn wiki_url(&self) -> Option<String> {
        if let Some(value) = env_nonempty("WIKI_URL") {
            return Some(value);
        }
        if let Some(url) = &self.wiki.url {
            return Some(url.clone());
        }
        derive_wiki_url(&self.api_url())
    }

    pub fn user_agent(&self) -> String {
        env_or(
            "WIKI_USER_AGENT",
            self.wiki.user_agent.as_deref(),
            DEFAULT_USER_AGENT,
        )
    }

    pub fn article_path(&self) -> String {
        env_or(
            "WIKI_ARTICLE_PATH",
            self.wiki.article_path.as_deref(),
            DEFAULT_ARTICLE_PATH,
        )
    }

    /// Credentials from WIKI_USERNAME/WIKI_PASSWORD, falling back to `[auth]`.
    pub fn credentials(&self) -> Option<Credentials> {
        let username = env_nonempty("WIKI_USERNAME").or_else(|| self.auth.username.clone())?;
        let password = env_nonempty("WIKI_PASSWORD").or_else(|| self.auth.password.clone())?;
        if username.trim().is_empty() || password.is_empty() {
            return None;
        }
        Some(Credentials { username, password })
    }

    pub fn category_namespace(&self) -> CategoryNamespace {
        let local = self
            .wiki
            .category_namespace
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(DEFAULT_CATEGORY_NAMESPACE);
        CategoryNamespace::new(local, CATEGORY_NAMESPACE_ALIASES)
    }

    pub fn draft_markers(&self) -> DraftMarkers {
        let mut markers = DraftMarkers::default();
        if !self.wiki.draft_prefixes.is_empty() {
            markers.title_prefixes = self.wiki.draft_prefixes.clone();
        }
        markers
    }

    pub fn source_api_url(&self) -> String {
        env_or(
            "WIKI_SOURCE_API_URL",
            self.crosswiki.source_api_url.as_deref(),
            DEFAULT_SOURCE_API_URL,
        )
    }

    pub fn wikidata_api_url(&self) -> String {
        env_or(
            "WIKIDATA_API_URL",
            self.crosswiki.wikidata_api_url.as_deref(),
            DEFAULT_WIKIDATA_API_URL,
        )
    }

    pub fn source_site(&self) -> String {
        self.crosswiki
            .source_site
            .clone()
            .unwrap_or_else(|| DEFAULT_SOURCE_SITE.to_string())
    }

    pub fn target_site(&self) -> String {
        self.crosswiki
            .target_site
            .clone()
            .unwrap_or_else(|| DEFAULT_TARGET_SITE.to_string())
    }

    /// Pause between submitted edits: env WIKI_EDIT_DELAY_MS > config > default.
    pub fn edit_delay(&self) -> Duration {
        let millis = env_nonempty("WIKI_EDIT_DELAY_MS")
            .and_then(|value| value.parse::<u64>().ok())
            .or(self.pacing.edit_delay_ms)
            .unwrap_or(DEFAULT_EDIT_DELAY_MS);
        Duration::from_millis(millis)
    }

    pub fn unsourced_rules(&self) -> UnsourcedRules {
        UnsourcedRules {
            draft: self.draft_markers(),
            ..UnsourcedRules::default()
        }
    }

    pub fn infobox_rules(&self) -> Result<InfoboxRules> {
        let templates: Vec<String> = if self.infobox.templates.is_empty() {
            owned(presets::INFOBOX_TEMPLATES)
        } else {
            self.infobox.templates.clone()
        };
        let renames: Vec<(String, String)> = if self.infobox.rename.is_empty() {
            presets::INFOBOX_RENAMES
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect()
        } else {
            self.infobox
                .rename
                .iter()
                .map(|entry| (entry.from.clone(), entry.to.clone()))
                .collect()
        };
        let deletes: Vec<String> = if self.infobox.delete.is_empty() {
            owned(presets::INFOBOX_DELETES)
        } else {
            self.infobox.delete.clone()
        };
        InfoboxRules::new(&templates, &renames, &deletes)
            .context("failed to compile infobox rename rules")
    }

    pub fn retarget_rules(&self) -> RetargetRules {
        RetargetRules {
            namespace: self.category_namespace(),
            ..RetargetRules::default()
        }
    }
}

/// Load and parse a WikiConfig from a TOML file. Returns default if file doesn't exist.
pub fn load_config(config_path: &Path) -> Result<WikiConfig> {
    if !config_path.exists() {
        return Ok(WikiConfig::default());
    }
    let content = fs::read_to_string(config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let parsed: WikiConfig = toml::from_str(&content)
        .with_context(|| format!("failed to parse {}", config_path.display()))?;
    Ok(parsed)
}

/// Derive wiki base URL from an API URL by stripping `/w/api.php` or `/api.php`.
pub fn derive_wiki_url(api_url: &str) -> Option<String> {
    let trimmed = api_url.trim();
    let stripped = trimmed
        .strip_suffix("/w/api.php")
        .or_else(|| trimmed.strip_suffix("/api.php"))
        .unwrap_or(trimmed);
    let result = stripped.trim_end_matches('/').to_string();
    if result.is_empty() {
        None
    } else {
        Some(result)
    }
}

fn env_nonempty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_or(key: &str, configured: Option<&str>, default: &str) -> String {
    env_nonempty(key)
        .or_else(|| configured.map(ToString::to_string))
        .unwrap_or_else(|| default.to_string())
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}
