use std::net::IpAddr;
use url::Url;

/// Two-label public suffixes under which registrations happen one level deeper
const MULTI_PART_SUFFIXES: &[&str] = &[
    "co.uk", "org.uk", "ac.uk", "gov.uk", "me.uk", "net.uk", "com.cn", "net.cn", "org.cn",
    "gov.cn", "edu.cn", "com.hk", "com.tw", "org.tw", "com.au", "net.au", "org.au", "edu.au",
    "co.jp", "ne.jp", "or.jp", "ac.jp", "co.kr", "or.kr", "co.nz", "org.nz", "co.in", "net.in",
    "org.in", "com.br", "net.br", "com.mx", "com.sg", "com.my", "co.za", "com.tr", "com.ar",
    "co.id", "com.vn", "com.ph",
];

/// Extracts the domain from a URL
///
/// Returns the lowercase host, or `None` when the URL has no host.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use recon_scan::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str()
        .map(|h| h.trim_start_matches('[').trim_end_matches(']').to_lowercase())
}

/// Returns the registrable domain of a host
///
/// IP literals and single-label hosts (`localhost`) are their own
/// registrable domain. Otherwise the last two labels are kept, or three when
/// the last two form a known multi-part public suffix.
///
/// # Examples
///
/// ```
/// use recon_scan::url::registrable_domain;
///
/// assert_eq!(registrable_domain("cdn.example.com"), "example.com");
/// assert_eq!(registrable_domain("www.bbc.co.uk"), "bbc.co.uk");
/// assert_eq!(registrable_domain("127.0.0.1"), "127.0.0.1");
/// ```
pub fn registrable_domain(host: &str) -> String {
    let host = host
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim_end_matches('.')
        .to_lowercase();

    if host.parse::<IpAddr>().is_ok() {
        return host;
    }

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() <= 2 {
        return host;
    }

    let last_two = labels[labels.len() - 2..].join(".");
    let keep = if MULTI_PART_SUFFIXES.contains(&last_two.as_str()) {
        3
    } else {
        2
    };

    labels[labels.len() - keep..].join(".")
}

/// Returns true if both hosts share a registrable domain
pub fn same_registrable_domain(a: &str, b: &str) -> bool {
    registrable_domain(a) == registrable_domain(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_simple_domain() {
        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_with_port() {
        let url = Url::parse("https://example.com:8080/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_ipv6() {
        let url = Url::parse("http://[::1]:8080/").unwrap();
        assert_eq!(extract_domain(&url), Some("::1".to_string()));
    }

    #[test]
    fn test_extract_mixed_case() {
        let url = Url::parse("https://Example.COM/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_registrable_domain() {
        assert_eq!(registrable_domain("example.com"), "example.com");
        assert_eq!(registrable_domain("www.example.com"), "example.com");
        assert_eq!(registrable_domain("api.v2.example.com"), "example.com");
        assert_eq!(registrable_domain("shop.example.co.uk"), "example.co.uk");
        assert_eq!(registrable_domain("Example.COM."), "example.com");
        assert_eq!(registrable_domain("localhost"), "localhost");
        assert_eq!(registrable_domain("10.0.0.12"), "10.0.0.12");
        assert_eq!(registrable_domain("[::1]"), "::1");
    }

    #[test]
    fn test_same_registrable_domain() {
        assert!(same_registrable_domain("cdn.example.com", "example.com"));
        assert!(!same_registrable_domain("example.com", "example.org"));
        assert!(!same_registrable_domain("127.0.0.1", "localhost"));
    }
}
