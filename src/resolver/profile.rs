// Site profiles - per-site constants in one immutable value

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::ResolveError;
use super::traits::DEFAULT_USER_AGENT;

/// Supported catalog sites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Provider {
    /// JSON API catalog with embed pages
    #[default]
    Ppv,
    /// HTML homepage with event cards
    Streambtw,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ppv => "ppv",
            Self::Streambtw => "streambtw",
        }
    }

    pub fn profile(&self) -> SiteProfile {
        match self {
            Self::Ppv => SiteProfile::ppv(),
            Self::Streambtw => SiteProfile::streambtw(),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ppv" => Ok(Self::Ppv),
            "streambtw" => Ok(Self::Streambtw),
            other => Err(ResolveError::InvalidConfig(format!(
                "Unknown provider: {}",
                other
            ))),
        }
    }
}

/// Which referer a resolved stream advertises to the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RefererPolicy {
    /// Site's canonical referer, whichever candidate won
    #[default]
    Canonical,
    /// Referer of the winning candidate (its page for scraped candidates)
    Candidate,
}

impl FromStr for RefererPolicy {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "canonical" => Ok(Self::Canonical),
            "candidate" => Ok(Self::Candidate),
            other => Err(ResolveError::InvalidConfig(format!(
                "Unknown referer policy: {}",
                other
            ))),
        }
    }
}

/// How the catalog document is encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CatalogFormat {
    Json,
    Html,
}

/// Site-specific constants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteProfile {
    pub provider: Provider,
    pub catalog_url: String,
    pub catalog_format: CatalogFormat,
    /// Canonical referer (and origin source) for resolved streams
    pub referer: String,
    /// UA advertised to players in the playlist
    pub user_agent: String,
    /// Fallback page URLs, `{slug}` is replaced
    pub slug_templates: Vec<String>,
    /// Direct manifest URL, `{tag}` is replaced
    pub direct_template: Option<String>,
    /// Channel codes accepted regardless of shape
    pub known_channels: Vec<String>,
}

const PPV_KNOWN_CHANNELS: &[&str] = &[
    "ESPN", "ESPN2", "ESPNU", "ESPNEWS", "ESPN_DEPORTES", "FS1", "FS2", "TNT", "TBS", "TRUTV",
    "NBCSN", "CBSSN", "NFLN", "NFL_REDZONE", "NBATV", "MLBN", "NHLN", "BTN", "SECN", "ACCN",
    "GOLF", "TENNIS_CHANNEL", "BEIN_SPORTS", "BEIN_SPORTS_EN", "SKY_SPORTS_MAIN_EVENT",
    "SKY_SPORTS_PREMIER_LEAGUE", "SKY_SPORTS_F1", "TNT_SPORTS_1", "TNT_SPORTS_2", "DAZN_1",
];

impl SiteProfile {
    pub fn ppv() -> Self {
        Self {
            provider: Provider::Ppv,
            catalog_url: "https://ppv.to/api/streams".to_string(),
            catalog_format: CatalogFormat::Json,
            referer: "https://ppv.to/".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            slug_templates: vec![
                "https://ppv.to/live/{slug}".to_string(),
                "https://watchlive.top/embed/{slug}".to_string(),
            ],
            direct_template: Some("https://streams.ppv.to/{tag}/index.m3u8".to_string()),
            known_channels: PPV_KNOWN_CHANNELS.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn streambtw() -> Self {
        Self {
            provider: Provider::Streambtw,
            catalog_url: "https://streambtw.com/".to_string(),
            catalog_format: CatalogFormat::Html,
            referer: "https://streambtw.com/".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 11.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/134.0.6998.166 Safari/537.36".to_string(),
            slug_templates: Vec::new(),
            direct_template: None,
            known_channels: Vec::new(),
        }
    }

    pub fn with_catalog_url(mut self, url: impl Into<String>) -> Self {
        self.catalog_url = url.into();
        self
    }

    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = referer.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_slug_templates(mut self, templates: Vec<String>) -> Self {
        self.slug_templates = templates;
        self
    }

    pub fn with_direct_template(mut self, template: Option<String>) -> Self {
        self.direct_template = template;
        self
    }

    /// Reject templates without their placeholder
    pub fn validate(&self) -> Result<(), ResolveError> {
        if let Some(bad) = self.slug_templates.iter().find(|t| !t.contains("{slug}")) {
            return Err(ResolveError::InvalidConfig(format!(
                "Slug template without {{slug}}: {}",
                bad
            )));
        }
        if let Some(template) = &self.direct_template {
            if !template.contains("{tag}") {
                return Err(ResolveError::InvalidConfig(format!(
                    "Direct template without {{tag}}: {}",
                    template
                )));
            }
        }
        Ok(())
    }

    pub fn slug_pages(&self, slug: &str) -> Vec<String> {
        self.slug_templates
            .iter()
            .map(|t| t.replace("{slug}", slug))
            .collect()
    }

    pub fn direct_url(&self, tag: &str) -> Option<String> {
        self.direct_template
            .as_ref()
            .map(|t| t.replace("{tag}", tag))
    }

    pub fn is_known_channel(&self, code: &str) -> bool {
        self.known_channels.iter().any(|c| c == code)
    }
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self::ppv()
    }
}
