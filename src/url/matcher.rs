/// Checks if a domain matches a domain pattern
///
/// Matching is label-exact on the suffix: pattern `P` matches domain `D` when
/// `P == D` or the trailing labels of `D` are exactly the labels of `P`.
/// A leading `*.` or `.` on the pattern is accepted and ignored, and the
/// comparison is case-insensitive.
///
/// # Examples
///
/// ```
/// use recon_scan::url::domain_matches;
///
/// assert!(domain_matches("example.com", "example.com"));
/// assert!(domain_matches("example.com", "www.example.com"));
/// assert!(domain_matches("shop.example.com", "api.shop.example.com"));
/// assert!(!domain_matches("example.com", "otherexample.com"));
/// ```
pub fn domain_matches(pattern: &str, domain: &str) -> bool {
    let pattern = pattern
        .trim()
        .trim_start_matches("*.")
        .trim_start_matches('.')
        .trim_end_matches('.');
    let domain = domain.trim().trim_end_matches('.');

    if pattern.is_empty() || domain.is_empty() {
        return false;
    }

    if domain.eq_ignore_ascii_case(pattern) {
        return true;
    }

    if domain.len() <= pattern.len() {
        return false;
    }

    let split = domain.len() - pattern.len();
    domain.is_char_boundary(split)
        && domain[split..].eq_ignore_ascii_case(pattern)
        && domain.as_bytes()[split - 1] == b'.'
}

/// Returns true if any pattern in the list matches the domain
pub fn matches_any(patterns: &[String], domain: &str) -> bool {
    patterns.iter().any(|p| domain_matches(p, domain))
}
