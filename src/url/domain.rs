use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use seedcrawl::url::extract_host;
///
/// let url = Url::parse("https://PL.wikipedia.org/wiki/Zeus").unwrap();
/// assert_eq!(extract_host(&url), Some("pl.wikipedia.org".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns the scheme+host(+port) key of a URL
///
/// Robots policies and politeness slots are kept per key, so `http://a` and
/// `https://a` are tracked separately, as are different ports on one host.
pub fn host_key(url: &Url) -> String {
    url.origin().ascii_serialization()
}

/// Returns true if the URL path starts with any of the given prefixes
pub fn is_ignored_path(url: &Url, prefixes: &[String]) -> bool {
    let path = url.path();
    prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
}
