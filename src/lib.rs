pub mod resolver;

use std::path::PathBuf;

use log::{info, warn};

use resolver::{
    load_catalog, source_for, write_playlist, CatalogCache, CatalogSource, FetchConfig,
    HttpPageFetcher, LoadedCatalog, LocalCatalogSource, PageFetcher, Provider, RefererPolicy,
    ResolveError, Resolver, RunSummary, SiteProfile,
};

/// Everything one run needs
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub profile: SiteProfile,
    pub fetch: FetchConfig,
    pub output: PathBuf,
    /// Read the catalog from this file instead of the network
    pub catalog_file: Option<PathBuf>,
    /// Where the fallback catalog lives; `None` disables caching
    pub cache_dir: Option<PathBuf>,
    pub referer_policy: RefererPolicy,
}

impl RunConfig {
    pub fn new(provider: Provider) -> Self {
        Self {
            profile: provider.profile(),
            fetch: FetchConfig::default(),
            output: PathBuf::from(format!("{}.m3u8", provider)),
            catalog_file: None,
            cache_dir: CatalogCache::default_dir(),
            referer_policy: RefererPolicy::default(),
        }
    }
}

/// Build the HTTP client from `config.fetch` and run the pipeline
pub async fn run(config: RunConfig) -> Result<RunSummary, ResolveError> {
    let fetcher = HttpPageFetcher::new(config.fetch.clone())?;
    run_with_fetcher(&config, &fetcher).await
}

/// Catalog -> resolve every descriptor -> playlist file
pub async fn run_with_fetcher(
    config: &RunConfig,
    fetcher: &dyn PageFetcher,
) -> Result<RunSummary, ResolveError> {
    let profile = &config.profile;
    profile.validate()?;

    let loaded = match &config.catalog_file {
        Some(path) => LoadedCatalog {
            catalog: LocalCatalogSource::new(path, profile)
                .fetch_catalog(fetcher)
                .await?,
            from_cache: false,
        },
        None => {
            let cache = config.cache_dir.as_ref().map(CatalogCache::new);
            let source = source_for(profile);
            load_catalog(source.as_ref(), fetcher, cache.as_ref(), profile.provider).await?
        }
    };

    let resolver =
        Resolver::new(profile.clone(), fetcher).with_referer_policy(config.referer_policy);
    let resolution = resolver.resolve_catalog(&loaded.catalog).await;

    info!(
        "Total streams extracted: {} of {}",
        resolution.records.len(),
        resolution.total
    );
    for (reason, count) in &resolution.failures {
        info!("  {} candidate fetches failed: {}", count, reason);
    }

    let output_path = if resolution.records.is_empty() {
        warn!("No streams were extracted; playlist not written");
        None
    } else {
        write_playlist(&config.output, &resolution.records).await?;
        info!("M3U playlist generated: {}", config.output.display());
        Some(config.output.display().to_string())
    };

    Ok(RunSummary {
        total: resolution.total,
        resolved: resolution.records.len(),
        catalog_from_cache: loaded.from_cache,
        output_path,
    })
}
