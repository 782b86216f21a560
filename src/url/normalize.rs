use crate::UrlError;
use url::Url;

/// Tracking query parameters removed during normalization
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid"];

/// Normalizes a URL into the canonical form used to key the visited-page map
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject schemes other than HTTP and HTTPS
/// 3. Lowercase the host (default ports are dropped by the parser)
/// 4. Empty path becomes / (dot segments are resolved by the parser)
/// 5. Remove fragment (everything after #)
/// 6. Remove tracking query parameters
/// 7. Sort remaining query parameters by key
/// 8. Remove empty query string (trailing ?)
///
/// Trailing slashes and `www.` prefixes are preserved: on a single site they
/// routinely name different resources.
///
/// # Examples
///
/// ```
/// use sumi_map::url::normalize_url;
///
/// let url = normalize_url("http://EXAMPLE.COM:80/docs/?b=2&a=1#top").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/docs/?a=1&b=2");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;
    normalize_parsed(url)
}

/// Normalizes an already-parsed URL
fn normalize_parsed(mut url: Url) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => {
            let normalized_host = host.to_lowercase();
            url.set_host(Some(&normalized_host))
                .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;
        }
        _ => return Err(UrlError::MissingDomain),
    }

    if url.path().is_empty() {
        url.set_path("/");
    }

    url.set_fragment(None);

    if let Some(query) = url.query() {
        let params = filter_and_sort_query_params(query);

        if params.is_empty() {
            url.set_query(None);
        } else {
            let query = params.join("&");
            url.set_query(Some(&query));
        }
    }

    Ok(url)
}

/// Filters out tracking parameters and sorts the remaining ones by key
///
/// Pairs are kept byte-for-byte as they appear in the URL. Decoding and
/// re-encoding them as form data would turn `?flag` into `?flag=` and
/// escape `/` and `~`, naming a different resource.
fn filter_and_sort_query_params(query: &str) -> Vec<&str> {
    let mut params: Vec<&str> = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| !is_tracking_param(param_key(pair)))
        .collect();

    // Stable sort keeps repeated keys in their original order
    params.sort_by(|a, b| param_key(a).cmp(param_key(b)));

    params
}

/// Raw key of one `key=value` pair
fn param_key(pair: &str) -> &str {
    pair.split_once('=').map_or(pair, |(key, _)| key)
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
