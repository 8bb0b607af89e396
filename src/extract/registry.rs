use super::ExtractorKind;
use crate::config::SiteEntry;
use crate::url::matches_wildcard;
use url::Url;

/// Maps hosts to the extractor of their site family
///
/// Patterns are tried in declaration order; the first match wins.
#[derive(Debug, Clone, Default)]
pub struct ExtractorRegistry {
    patterns: Vec<(String, ExtractorKind)>,
}

impl ExtractorRegistry {
    pub fn from_sites(sites: &[SiteEntry]) -> Self {
        let patterns = sites
            .iter()
            .map(|site| (site.domain.to_lowercase(), site.extractor))
            .collect();
        Self { patterns }
    }

    /// Finds the extractor responsible for `url`'s host
    pub fn resolve(&self, url: &Url) -> Option<ExtractorKind> {
        let host = url.host_str()?.to_lowercase();
        self.patterns
            .iter()
            .find(|(pattern, _)| matches_wildcard(pattern, &host))
            .map(|(_, kind)| *kind)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
