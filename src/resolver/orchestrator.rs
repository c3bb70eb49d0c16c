// Resolver - runs a descriptor's candidates in order, first success wins
//
// Strategy:
// 1. Direct candidates are accepted without any network call
// 2. Scrape candidates: fetch page -> extract manifest URL
// 3. Any miss moves on to the next candidate; running out is not an error

use std::collections::BTreeMap;

use log::{debug, info, warn};

use super::candidates::CandidateGenerator;
use super::errors::CandidateMiss;
use super::extractors::{extract_manifest_url, extract_with_source, FailureReason};
use super::models::{
    origin_of, CandidateKind, Catalog, CatalogEntry, PlaylistRecord, ResolutionCandidate,
    ResolvedStream,
};
use super::profile::{RefererPolicy, SiteProfile};
use super::traits::{FetchOutcome, PageFetcher};

/// Record of one candidate attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateAttempt {
    pub candidate: ResolutionCandidate,
    pub miss: Option<CandidateMiss>,
}

/// Everything that happened while resolving one descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionReport {
    pub stream: Option<ResolvedStream>,
    pub attempts: Vec<CandidateAttempt>,
}

impl ResolutionReport {
    /// Candidates that were actually fetched
    pub fn fetch_count(&self) -> usize {
        self.attempts
            .iter()
            .filter(|a| a.candidate.kind == CandidateKind::ScrapePage)
            .count()
    }
}

/// Records plus counters for a whole catalog
#[derive(Debug, Clone, Default)]
pub struct CatalogResolution {
    pub records: Vec<PlaylistRecord>,
    pub total: usize,
    /// Fetch failures seen along the way, by reason
    pub failures: BTreeMap<String, usize>,
}

/// Turns catalog entries into resolved streams
pub struct Resolver<'a> {
    generator: CandidateGenerator,
    fetcher: &'a dyn PageFetcher,
    policy: RefererPolicy,
}

impl<'a> Resolver<'a> {
    pub fn new(profile: SiteProfile, fetcher: &'a dyn PageFetcher) -> Self {
        Self {
            generator: CandidateGenerator::new(profile),
            fetcher,
            policy: RefererPolicy::default(),
        }
    }

    pub fn with_referer_policy(mut self, policy: RefererPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Resolve one descriptor; `None` when no candidate yields a manifest
    pub async fn resolve(&self, entry: &CatalogEntry) -> Option<ResolvedStream> {
        self.resolve_detailed(entry).await.stream
    }

    pub async fn resolve_detailed(&self, entry: &CatalogEntry) -> ResolutionReport {
        let candidates = self.generator.generate(entry);
        let mut report = ResolutionReport::default();

        if candidates.is_empty() {
            debug!("[Resolver] '{}' has no tag, embed or slug", entry.name);
            return report;
        }

        for candidate in candidates {
            debug!(
                "[Resolver] '{}' trying #{} {:?} {}",
                entry.name, candidate.priority, candidate.kind, candidate.target_url
            );

            match self.try_candidate(&candidate).await {
                Ok(stream) => {
                    debug!("[Resolver] '{}' resolved via #{}", entry.name, candidate.priority);
                    report.attempts.push(CandidateAttempt {
                        candidate,
                        miss: None,
                    });
                    report.stream = Some(stream);
                    return report;
                }
                Err(miss) => {
                    debug!("[Resolver] '{}' #{} missed: {}", entry.name, candidate.priority, miss);
                    report.attempts.push(CandidateAttempt {
                        candidate,
                        miss: Some(miss),
                    });
                }
            }
        }

        report
    }

    async fn try_candidate(
        &self,
        candidate: &ResolutionCandidate,
    ) -> Result<ResolvedStream, CandidateMiss> {
        match candidate.kind {
            CandidateKind::DirectConstruct => {
                // template output still has to look like a manifest URL
                match extract_manifest_url(&candidate.target_url) {
                    Some(url) if url == candidate.target_url => {
                        Ok(self.build_stream(url, candidate))
                    }
                    _ => Err(CandidateMiss::MalformedDirect),
                }
            }
            CandidateKind::ScrapePage => {
                let outcome = self
                    .fetcher
                    .fetch(&candidate.target_url, Some(&candidate.referer))
                    .await;
                let body = match outcome {
                    FetchOutcome::Page { body, .. } => body,
                    FetchOutcome::Failed(failure) => return Err(CandidateMiss::Fetch(failure)),
                };
                match extract_with_source(&body) {
                    Some((url, source)) => {
                        debug!("[Resolver] {:?} match in {}", source, candidate.target_url);
                        Ok(self.build_stream(url, candidate))
                    }
                    None => Err(CandidateMiss::NoManifest),
                }
            }
        }
    }

    fn build_stream(&self, manifest_url: String, candidate: &ResolutionCandidate) -> ResolvedStream {
        let profile = self.generator.profile();
        let referer = match (self.policy, candidate.kind) {
            (RefererPolicy::Canonical, _) => profile.referer.clone(),
            (RefererPolicy::Candidate, CandidateKind::DirectConstruct) => candidate.referer.clone(),
            (RefererPolicy::Candidate, CandidateKind::ScrapePage) => candidate.target_url.clone(),
        };
        let origin = origin_of(&referer).unwrap_or_else(|| referer.trim_end_matches('/').to_string());

        ResolvedStream {
            manifest_url,
            origin,
            referer,
            user_agent: profile.user_agent.clone(),
        }
    }

    /// Resolve every entry of `catalog`, one at a time, in catalog order
    pub async fn resolve_catalog(&self, catalog: &Catalog) -> CatalogResolution {
        let mut result = CatalogResolution::default();

        if catalog.streams.is_empty() {
            warn!("[Resolver] Catalog has no categories");
            return result;
        }

        for category in &catalog.streams {
            info!(
                "Processing category: {} ({} streams)",
                category.category,
                category.streams.len()
            );

            for entry in &category.streams {
                result.total += 1;
                let report = self.resolve_detailed(entry).await;

                for attempt in &report.attempts {
                    if let Some(CandidateMiss::Fetch(failure)) = &attempt.miss {
                        let reason: FailureReason = failure.reason();
                        *result
                            .failures
                            .entry(reason.description().to_string())
                            .or_insert(0) += 1;
                    }
                }

                match report.stream {
                    Some(stream) => {
                        info!("  ✓ {} -> {}", entry.name, stream.manifest_url);
                        result
                            .records
                            .push(PlaylistRecord::new(entry, &category.category, stream));
                    }
                    None => debug!("  ✗ {} ({} candidates tried)", entry.name, report.attempts.len()),
                }
            }
        }

        result
    }
}
