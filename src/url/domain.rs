use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host (which shouldn't happen for valid HTTP(S) URLs), it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_map::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns true when both URLs point at the same host
///
/// The host name is compared case-insensitively together with any explicit
/// port. A port equal to the scheme default is not explicit, so `http://a/`
/// and `https://a/` share a host while `http://a:8080/` does not.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_map::url::same_host;
///
/// let target = Url::parse("https://example.com/").unwrap();
/// assert!(same_host(&target, &Url::parse("http://EXAMPLE.com/docs").unwrap()));
/// assert!(!same_host(&target, &Url::parse("https://blog.example.com/").unwrap()));
/// ```
pub fn same_host(a: &Url, b: &Url) -> bool {
    match (extract_domain(a), extract_domain(b)) {
        (Some(host_a), Some(host_b)) => host_a == host_b && a.port() == b.port(),
        _ => false,
    }
}
