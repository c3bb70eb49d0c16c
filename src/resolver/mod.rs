// Resolver module - catalog descriptors to playable manifest URLs
//
// Flow:
//   CatalogSource -> CandidateGenerator -> Resolver (PageFetcher + extractors)
//   -> PlaylistRecord -> playlist

pub mod candidates;
pub mod catalog;
pub mod errors;
pub mod extractors;
pub mod fetcher;
pub mod models;
pub mod orchestrator;
pub mod playlist;
pub mod profile;
pub mod traits;

pub use candidates::{normalize_tag, CandidateGenerator};
pub use catalog::{load_catalog, source_for, CatalogCache, LoadedCatalog, LocalCatalogSource};
pub use errors::{CandidateMiss, FetchFailure, ResolveError};
pub use extractors::{extract_manifest_url, FailureReason};
pub use fetcher::HttpPageFetcher;
pub use models::{
    CandidateKind, Catalog, CatalogCategory, CatalogEntry, PlaylistRecord, ResolutionCandidate,
    ResolvedStream, RunSummary,
};
pub use orchestrator::{ResolutionReport, Resolver};
pub use playlist::{render_playlist, write_playlist};
pub use profile::{Provider, RefererPolicy, SiteProfile};
pub use traits::{CatalogSource, FetchConfig, FetchOutcome, PageFetcher};
