// Catalog sources - JSON API, HTML homepage, local file - plus the cache
// used when the live source is unreachable

use std::path::PathBuf;
use std::time::SystemTime;

use async_trait::async_trait;
use log::{debug, info, warn};
use scraper::{ElementRef, Html, Selector};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use url::Url;

use super::errors::ResolveError;
use super::models::{Catalog, CatalogCategory, CatalogEntry, DEFAULT_CATEGORY, DEFAULT_NAME};
use super::profile::{CatalogFormat, Provider, SiteProfile};
use super::traits::{CatalogSource, FetchOutcome, PageFetcher};

lazy_static::lazy_static! {
    static ref CARD_SEL: Selector = Selector::parse("div.card").unwrap();
    static ref TITLE_SEL: Selector = Selector::parse("h5.card-title").unwrap();
    static ref TEXT_SEL: Selector = Selector::parse("p.card-text").unwrap();
    static ref LINK_SEL: Selector = Selector::parse("a.btn.btn-primary").unwrap();
    static ref LOGO_SEL: Selector = Selector::parse("img.league-logo").unwrap();
}

/// Catalog served as JSON (`{"streams": [{"category", "streams": [...]}]}`)
pub struct ApiCatalogSource {
    url: String,
}

impl ApiCatalogSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl CatalogSource for ApiCatalogSource {
    fn name(&self) -> &'static str {
        "json-api"
    }

    async fn fetch_catalog(&self, fetcher: &dyn PageFetcher) -> Result<Catalog, ResolveError> {
        info!("Fetching catalog: {}", self.url);
        let body = fetch_document(fetcher, &self.url).await?;
        parse_json_catalog(&body)
    }
}

/// Catalog scraped from a homepage of event cards
pub struct HtmlCatalogSource {
    url: String,
}

impl HtmlCatalogSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl CatalogSource for HtmlCatalogSource {
    fn name(&self) -> &'static str {
        "html-cards"
    }

    async fn fetch_catalog(&self, fetcher: &dyn PageFetcher) -> Result<Catalog, ResolveError> {
        info!("Fetching homepage: {}", self.url);
        let body = fetch_document(fetcher, &self.url).await?;
        parse_html_catalog(&body, &self.url)
    }
}

/// Catalog read from disk, in either format
pub struct LocalCatalogSource {
    path: PathBuf,
    format: CatalogFormat,
    /// Base for relative links in HTML catalogs
    base_url: String,
}

impl LocalCatalogSource {
    pub fn new(path: impl Into<PathBuf>, profile: &SiteProfile) -> Self {
        Self {
            path: path.into(),
            format: profile.catalog_format,
            base_url: profile.catalog_url.clone(),
        }
    }
}

#[async_trait]
impl CatalogSource for LocalCatalogSource {
    fn name(&self) -> &'static str {
        "local-file"
    }

    async fn fetch_catalog(&self, _fetcher: &dyn PageFetcher) -> Result<Catalog, ResolveError> {
        info!("Reading catalog file: {}", self.path.display());
        let body = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            ResolveError::CatalogUnavailable(format!("{}: {}", self.path.display(), e))
        })?;
        match self.format {
            CatalogFormat::Json => parse_json_catalog(&body),
            CatalogFormat::Html => parse_html_catalog(&body, &self.base_url),
        }
    }
}

/// Pick the live source matching the profile's catalog format
pub fn source_for(profile: &SiteProfile) -> Box<dyn CatalogSource> {
    match profile.catalog_format {
        CatalogFormat::Json => Box::new(ApiCatalogSource::new(profile.catalog_url.clone())),
        CatalogFormat::Html => Box::new(HtmlCatalogSource::new(profile.catalog_url.clone())),
    }
}

async fn fetch_document(fetcher: &dyn PageFetcher, url: &str) -> Result<String, ResolveError> {
    match fetcher.fetch(url, None).await {
        FetchOutcome::Page { body, .. } => Ok(body),
        FetchOutcome::Failed(failure) => Err(ResolveError::CatalogUnavailable(format!(
            "{}: {}",
            url, failure
        ))),
    }
}

pub fn parse_json_catalog(body: &str) -> Result<Catalog, ResolveError> {
    let catalog: Catalog = serde_json::from_str(body)?;
    if catalog.streams.is_empty() {
        warn!("Catalog has no 'streams' categories");
    }
    Ok(catalog)
}

/// Parse event cards; cards without a watch link are skipped
pub fn parse_html_catalog(html: &str, base_url: &str) -> Result<Catalog, ResolveError> {
    let base = Url::parse(base_url)
        .map_err(|e| ResolveError::InvalidConfig(format!("Bad catalog URL {}: {}", base_url, e)))?;
    let document = Html::parse_document(html);
    let mut categories: Vec<CatalogCategory> = Vec::new();

    for card in document.select(&CARD_SEL) {
        let Some(href) = card
            .select(&LINK_SEL)
            .next()
            .and_then(|a| a.value().attr("href"))
        else {
            continue;
        };
        let embed_url = match base.join(href.trim()) {
            Ok(url) => url.to_string(),
            Err(e) => {
                debug!("Skipping card with bad link {}: {}", href, e);
                continue;
            }
        };

        let category = first_text(&card, &TITLE_SEL).unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
        let name = first_text(&card, &TEXT_SEL).unwrap_or_else(|| DEFAULT_NAME.to_string());
        let poster = card
            .select(&LOGO_SEL)
            .next()
            .and_then(|img| img.value().attr("src"))
            .unwrap_or_default();

        let entry = CatalogEntry::new(name)
            .with_embed_url(embed_url)
            .with_poster(poster);

        match categories.iter_mut().find(|c| c.category == category) {
            Some(existing) => existing.streams.push(entry),
            None => categories.push(CatalogCategory {
                category,
                streams: vec![entry],
            }),
        }
    }

    Ok(Catalog {
        streams: categories,
    })
}

fn first_text(card: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    let text: String = card.select(selector).next()?.text().collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Last good catalog per provider, stored as JSON
#[derive(Debug, Clone)]
pub struct CatalogCache {
    dir: PathBuf,
}

impl CatalogCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<cache_dir>/live-playlist`, if the platform has a cache dir
    pub fn default_dir() -> Option<PathBuf> {
        dirs::cache_dir().map(|d| d.join("live-playlist"))
    }

    pub fn path_for(&self, provider: Provider) -> PathBuf {
        self.dir.join(format!("{}-catalog.json", provider))
    }

    pub fn store(&self, provider: Provider, catalog: &Catalog) -> Result<(), ResolveError> {
        std::fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(catalog)
            .map_err(|e| ResolveError::CatalogParse(e.to_string()))?;
        std::fs::write(self.path_for(provider), json)?;
        Ok(())
    }

    /// Cached catalog and its modification time; `None` if never stored
    pub fn load(
        &self,
        provider: Provider,
    ) -> Result<Option<(Catalog, Option<SystemTime>)>, ResolveError> {
        let path = self.path_for(provider);
        if !path.exists() {
            return Ok(None);
        }
        let body = std::fs::read_to_string(&path)?;
        let catalog: Catalog = serde_json::from_str(&body)?;
        let modified = std::fs::metadata(&path).and_then(|m| m.modified()).ok();
        Ok(Some((catalog, modified)))
    }
}

/// Catalog plus where it came from
#[derive(Debug, Clone)]
pub struct LoadedCatalog {
    pub catalog: Catalog,
    pub from_cache: bool,
}

/// Fetch the live catalog, refreshing the cache on success and falling back
/// to it on failure
pub async fn load_catalog(
    source: &dyn CatalogSource,
    fetcher: &dyn PageFetcher,
    cache: Option<&CatalogCache>,
    provider: Provider,
) -> Result<LoadedCatalog, ResolveError> {
    let live_error = match source.fetch_catalog(fetcher).await {
        Ok(catalog) => {
            if let Some(cache) = cache {
                match cache.store(provider, &catalog) {
                    Ok(()) => debug!("Cached catalog at {}", cache.path_for(provider).display()),
                    Err(e) => warn!("Could not cache catalog: {}", e),
                }
            }
            return Ok(LoadedCatalog {
                catalog,
                from_cache: false,
            });
        }
        Err(e) => e,
    };

    warn!("Catalog source {} failed: {}", source.name(), live_error);

    let Some(cache) = cache else {
        return Err(ResolveError::CatalogUnavailable(live_error.to_string()));
    };

    match cache.load(provider) {
        Ok(Some((catalog, modified))) => {
            info!(
                "Using cached catalog from {} ({} entries)",
                describe_time(modified),
                catalog.entry_count()
            );
            Ok(LoadedCatalog {
                catalog,
                from_cache: true,
            })
        }
        Ok(None) => Err(ResolveError::CatalogUnavailable(format!(
            "{} (no cached copy)",
            live_error
        ))),
        Err(cache_error) => Err(ResolveError::CatalogUnavailable(format!(
            "{} (cached copy unreadable: {})",
            live_error, cache_error
        ))),
    }
}

fn describe_time(modified: Option<SystemTime>) -> String {
    modified
        .and_then(|t| OffsetDateTime::from(t).format(&Rfc3339).ok())
        .unwrap_or_else(|| "an unknown time".to_string())
}
