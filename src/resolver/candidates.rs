// Candidate generation - ordered strategies for one descriptor
//
// Priority (highest first):
// 1. Direct manifest URL built from the channel tag (no fetch needed)
// 2. The descriptor's embed page
// 3. Fallback pages built from the slug

use std::collections::HashSet;

use super::models::{CandidateKind, CatalogEntry, ResolutionCandidate};
use super::profile::SiteProfile;

/// Longest tag accepted by shape alone (known channels may be longer)
pub const MAX_FREEFORM_TAG_LEN: usize = 12;

/// Builds resolution candidates from catalog entries
#[derive(Debug, Clone)]
pub struct CandidateGenerator {
    profile: SiteProfile,
}

impl CandidateGenerator {
    pub fn new(profile: SiteProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &SiteProfile {
        &self.profile
    }

    /// Ordered, deduplicated candidates for `entry`; empty when the entry
    /// has no tag, embed URL, or slug
    pub fn generate(&self, entry: &CatalogEntry) -> Vec<ResolutionCandidate> {
        let mut raw: Vec<(CandidateKind, String, String)> = Vec::new();
        let slug_pages = entry
            .slug
            .as_deref()
            .map(|slug| self.profile.slug_pages(slug))
            .unwrap_or_default();

        if let Some(direct) = self.direct_candidate(entry, &slug_pages) {
            raw.push(direct);
        }

        if let Some(embed) = &entry.embed_url {
            raw.push((
                CandidateKind::ScrapePage,
                embed.clone(),
                self.profile.referer.clone(),
            ));
        }

        for page in slug_pages {
            raw.push((CandidateKind::ScrapePage, page, self.profile.referer.clone()));
        }

        let mut seen = HashSet::new();
        raw.into_iter()
            .filter(|(_, target, _)| seen.insert(target.clone()))
            .enumerate()
            .map(|(priority, (kind, target_url, referer))| ResolutionCandidate {
                kind,
                target_url,
                referer,
                priority,
            })
            .collect()
    }

    fn direct_candidate(
        &self,
        entry: &CatalogEntry,
        slug_pages: &[String],
    ) -> Option<(CandidateKind, String, String)> {
        let tag = normalize_tag(entry.tag.as_deref()?);
        if !self.accepts_tag(&tag) {
            return None;
        }
        let url = self.profile.direct_url(&tag)?;
        let referer = entry
            .embed_url
            .clone()
            .or_else(|| slug_pages.first().cloned())
            .unwrap_or_else(|| self.profile.referer.clone());
        Some((CandidateKind::DirectConstruct, url, referer))
    }

    /// Known channel code, or a short code made of `[A-Z0-9_]`
    pub fn accepts_tag(&self, normalized: &str) -> bool {
        if normalized.is_empty() {
            return false;
        }
        if self.profile.is_known_channel(normalized) {
            return true;
        }
        normalized.len() <= MAX_FREEFORM_TAG_LEN
            && normalized
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
    }
}

/// Trim, uppercase, drop whitespace, map `+`/`-` to `_`
pub fn normalize_tag(raw: &str) -> String {
    raw.trim()
        .to_uppercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == '+' || c == '-' { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> CandidateGenerator {
        CandidateGenerator::new(SiteProfile::ppv())
    }

    fn targets(candidates: &[ResolutionCandidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.target_url.as_str()).collect()
    }

    #[test]
    fn test_normalize_tag() {
        assert_eq!(normalize_tag("  espn "), "ESPN");
        assert_eq!(normalize_tag("Sky Sports-Main+Event"), "SKYSPORTS_MAIN_EVENT");
        assert_eq!(normalize_tag("nfl-redzone"), "NFL_REDZONE");
    }

    #[test]
    fn test_known_channel_is_first_and_direct() {
        let entry = CatalogEntry::new("ESPN").with_tag("ESPN");
        let candidates = generator().generate(&entry);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].kind, CandidateKind::DirectConstruct);
        assert_eq!(
            candidates[0].target_url,
            "https://streams.ppv.to/ESPN/index.m3u8"
        );
        assert_eq!(candidates[0].priority, 0);
        // no embed, no slug
        assert_eq!(candidates[0].referer, "https://ppv.to/");
    }

    #[test]
    fn test_long_known_channel_accepted() {
        let g = generator();
        assert!(!g.accepts_tag(&normalize_tag("sky sports premier league")));
        assert!(g.accepts_tag("SKY_SPORTS_PREMIER_LEAGUE"));
        assert!(g.accepts_tag(&normalize_tag("espn-deportes")));
    }

    #[test]
    fn test_tag_shape_rules() {
        let g = generator();
        assert!(g.accepts_tag("CHAN_42"));
        assert!(g.accepts_tag("ABCDEFGHIJKL"));
        assert!(!g.accepts_tag("ABCDEFGHIJKLM"));
        assert!(!g.accepts_tag("A.B"));
        assert!(!g.accepts_tag(""));
    }

    #[test]
    fn test_direct_referer_prefers_embed_then_slug() {
        let with_embed = CatalogEntry::new("x")
            .with_tag("fs1")
            .with_embed_url("https://x.test/e/9")
            .with_slug("x-game");
        assert_eq!(generator().generate(&with_embed)[0].referer, "https://x.test/e/9");

        let slug_only = CatalogEntry::new("x").with_tag("fs1").with_slug("x-game");
        assert_eq!(
            generator().generate(&slug_only)[0].referer,
            "https://ppv.to/live/x-game"
        );
    }

    #[test]
    fn test_embed_before_slug_pages() {
        let entry = CatalogEntry::new("Match")
            .with_tag("not a valid tag!")
            .with_embed_url("https://x.test/e/1")
            .with_slug("a-vs-b");
        let candidates = generator().generate(&entry);
        assert_eq!(
            targets(&candidates),
            vec![
                "https://x.test/e/1",
                "https://ppv.to/live/a-vs-b",
                "https://watchlive.top/embed/a-vs-b",
            ]
        );
        assert!(candidates.iter().all(|c| c.kind == CandidateKind::ScrapePage));
        assert_eq!(
            candidates.iter().map(|c| c.priority).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn test_dedup_keeps_first_seen() {
        let entry = CatalogEntry::new("Match")
            .with_embed_url("https://ppv.to/live/a-vs-b")
            .with_slug("a-vs-b");
        let candidates = generator().generate(&entry);
        assert_eq!(
            targets(&candidates),
            vec!["https://ppv.to/live/a-vs-b", "https://watchlive.top/embed/a-vs-b"]
        );
        assert_eq!(candidates[1].priority, 1);
    }

    #[test]
    fn test_empty_descriptor() {
        assert!(generator().generate(&CatalogEntry::new("Nothing")).is_empty());
    }

    #[test]
    fn test_no_direct_template_skips_tag() {
        let g = CandidateGenerator::new(SiteProfile::streambtw());
        let entry = CatalogEntry::new("x")
            .with_tag("ESPN")
            .with_embed_url("https://streambtw.com/iframe/1");
        let candidates = g.generate(&entry);
        assert_eq!(targets(&candidates), vec!["https://streambtw.com/iframe/1"]);
    }
}
