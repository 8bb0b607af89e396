/// Checks if a host matches a site's domain pattern
///
/// This function supports two types of patterns:
/// 1. Exact match: "example.com" matches only "example.com"
/// 2. Wildcard match: "*.example.com" matches:
///    - "example.com" (the bare domain)
///    - "blog.example.com" (single subdomain)
///    - "api.v2.example.com" (nested subdomains)
///
/// # Arguments
///
/// * `pattern` - The domain pattern, optionally starting with "*."
/// * `candidate` - The domain to check against the pattern
///
/// # Returns
///
/// * `true` - If the candidate matches the pattern
/// * `false` - Otherwise
///
/// # Examples
///
/// ```
/// use seedcrawl::url::matches_wildcard;
///
/// assert!(matches_wildcard("wolnelektury.pl", "wolnelektury.pl"));
/// assert!(!matches_wildcard("wolnelektury.pl", "www.wolnelektury.pl"));
///
/// assert!(matches_wildcard("*.wikipedia.org", "pl.wikipedia.org"));
/// assert!(matches_wildcard("*.wikipedia.org", "pl.m.wikipedia.org"));
/// assert!(!matches_wildcard("*.wikipedia.org", "wikipedia.org.evil.com"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    if let Some(base) = pattern.strip_prefix("*.") {
        candidate == base
            || candidate
                .strip_suffix(base)
                .is_some_and(|prefix| prefix.ends_with('.'))
    } else {
        candidate == pattern
    }
}
