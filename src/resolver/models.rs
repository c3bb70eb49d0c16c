// Common data models for the resolver

use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_NAME: &str = "Untitled";
pub const DEFAULT_CATEGORY: &str = "Unknown";

/// Top-level catalog payload: a list of categories
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub streams: Vec<CatalogCategory>,
}

impl Catalog {
    /// Number of descriptors across all categories
    pub fn entry_count(&self) -> usize {
        self.streams.iter().map(|c| c.streams.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entry_count() == 0
    }
}

/// One category (league, channel group) and its events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawCategory")]
pub struct CatalogCategory {
    pub category: String,
    pub streams: Vec<CatalogEntry>,
}

#[derive(Deserialize)]
struct RawCategory {
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    streams: Vec<CatalogEntry>,
}

impl From<RawCategory> for CatalogCategory {
    fn from(raw: RawCategory) -> Self {
        Self {
            category: non_empty(raw.category).unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            streams: raw.streams,
        }
    }
}

/// One live event / channel descriptor.
///
/// Missing or empty strings are treated as absent. Defaults are applied
/// here, once: `name` falls back to `"Untitled"`, `poster` to `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawEntry")]
pub struct CatalogEntry {
    /// Channel code, e.g. "ESPN"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    pub name: String,
    pub poster: String,
    /// Embed page that hosts the player
    #[serde(rename = "iframe", skip_serializing_if = "Option::is_none")]
    pub embed_url: Option<String>,
    /// Path-safe slug used to build fallback page URLs
    #[serde(rename = "uri_name", skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

#[derive(Deserialize)]
struct RawEntry {
    #[serde(default, alias = "channel")]
    tag: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    poster: Option<String>,
    #[serde(default)]
    iframe: Option<String>,
    #[serde(default)]
    uri_name: Option<String>,
}

impl From<RawEntry> for CatalogEntry {
    fn from(raw: RawEntry) -> Self {
        Self {
            tag: non_empty(raw.tag),
            name: non_empty(raw.name).unwrap_or_else(|| DEFAULT_NAME.to_string()),
            poster: non_empty(raw.poster).unwrap_or_default(),
            embed_url: non_empty(raw.iframe),
            slug: non_empty(raw.uri_name),
        }
    }
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_embed_url(mut self, url: impl Into<String>) -> Self {
        self.embed_url = Some(url.into());
        self
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn with_poster(mut self, poster: impl Into<String>) -> Self {
        self.poster = poster.into();
        self
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// How a candidate is turned into a manifest URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidateKind {
    /// Target URL already is the manifest; no fetch
    DirectConstruct,
    /// Fetch the target page and extract the manifest from it
    ScrapePage,
}

/// One strategy the resolver may try for a descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionCandidate {
    pub kind: CandidateKind,
    pub target_url: String,
    pub referer: String,
    /// Position in generation order, 0 is tried first
    pub priority: usize,
}

/// A manifest URL plus the headers a player must send to open it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedStream {
    pub manifest_url: String,
    pub origin: String,
    pub referer: String,
    pub user_agent: String,
}

/// Everything the playlist writer needs for one entry, in output order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistRecord {
    pub name: String,
    pub poster: String,
    pub group: String,
    pub manifest_url: String,
    pub origin: String,
    pub referer: String,
    pub user_agent: String,
}

impl PlaylistRecord {
    pub fn new(entry: &CatalogEntry, group: &str, stream: ResolvedStream) -> Self {
        Self {
            name: entry.name.clone(),
            poster: entry.poster.clone(),
            group: group.to_string(),
            manifest_url: stream.manifest_url,
            origin: stream.origin,
            referer: stream.referer,
            user_agent: stream.user_agent,
        }
    }
}

/// Outcome counters for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub resolved: usize,
    pub catalog_from_cache: bool,
    /// Written playlist path, `None` when nothing resolved
    pub output_path: Option<String>,
}

/// Scheme + host (+ non-default port) of `url`, e.g. `https://ppv.to`
pub fn origin_of(url: &str) -> Option<String> {
    let origin = Url::parse(url).ok()?.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}
