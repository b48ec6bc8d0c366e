use crate::UrlError;
use url::Url;

/// Pseudo-schemes that never point at a fetchable resource
const IGNORED_PREFIXES: &[&str] = &["javascript:", "mailto:", "tel:", "data:", "about:", "blob:"];

/// Resolves a raw link candidate against the document it was found in
///
/// # Resolution Rules
///
/// 1. Trim; reject empty, pseudo-scheme, template and whitespace-bearing values
/// 2. Full `http(s)://` URLs pass through unchanged
/// 3. Protocol-relative `//host/x` takes the document's scheme
/// 4. Hash routes `#/route` become `<origin>/#/route`; other bare fragments are rejected
/// 5. Absolute paths `/x` are joined to the document's origin
/// 6. Everything else is resolved with a segment stack starting from the
///    document's directory (`..` pops, `.` is skipped)
///
/// Query strings are kept. Fragments survive only when they are routes.
///
/// # Arguments
///
/// * `candidate` - The raw string pulled out of the document
/// * `base` - URL of the document the candidate was found in
///
/// # Returns
///
/// * `Ok(Url)` - Absolute http(s) URL
/// * `Err(UrlError)` - The candidate is not a crawlable link
///
/// # Examples
///
/// ```
/// use url::Url;
/// use recon_scan::url::resolve_candidate;
///
/// let base = Url::parse("http://h/admin/login.aspx").unwrap();
/// let url = resolve_candidate("../scripts/a.js", &base).unwrap();
/// assert_eq!(url.as_str(), "http://h/scripts/a.js");
/// ```
pub fn resolve_candidate(candidate: &str, base: &Url) -> Result<Url, UrlError> {
    let raw = candidate.trim();

    if raw.is_empty() {
        return Err(UrlError::Malformed("empty candidate".to_string()));
    }
    if raw.contains("${") || raw.contains("{{") || raw.chars().any(char::is_whitespace) {
        return Err(UrlError::Malformed(format!("not a literal URL: {}", raw)));
    }

    let lower = raw.to_ascii_lowercase();
    if IGNORED_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        return Err(UrlError::InvalidScheme(raw.to_string()));
    }

    let origin = base.origin().ascii_serialization();

    let resolved = if lower.starts_with("http://") || lower.starts_with("https://") {
        raw.to_string()
    } else if raw.starts_with("//") {
        format!("{}:{}", base.scheme(), raw)
    } else if raw.starts_with("#/") {
        format!("{}/{}", origin, raw)
    } else if raw.starts_with('#') {
        return Err(UrlError::Malformed("bare fragment".to_string()));
    } else if has_scheme(raw) {
        return Err(UrlError::InvalidScheme(raw.to_string()));
    } else if raw.starts_with('/') {
        format!("{}{}", origin, raw)
    } else {
        format!("{}{}", origin, resolve_relative_path(raw, base.path()))
    };

    let mut url = Url::parse(&resolved).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    if url.fragment().is_some_and(|f| !f.starts_with('/')) {
        url.set_fragment(None);
    }

    Ok(url)
}

/// True when the candidate starts with `<scheme>://`
///
/// A `://` inside the path or query (`/login?next=https://h/`) does not count.
fn has_scheme(raw: &str) -> bool {
    raw.find("://")
        .is_some_and(|idx| !raw[..idx].contains(['/', '?', '#']))
}

/// Resolves a relative reference against the directory of `doc_path`
///
/// Returns an absolute path with the reference's query string appended.
/// A query-only reference keeps the document path.
fn resolve_relative_path(relative: &str, doc_path: &str) -> String {
    let (path_part, suffix) = match relative.find(['?', '#']) {
        Some(idx) => relative.split_at(idx),
        None => (relative, ""),
    };

    if path_part.is_empty() {
        return format!("{}{}", doc_path, suffix);
    }

    // Directory of the current document: everything before the last '/'
    let mut stack: Vec<&str> = doc_path
        .rsplit_once('/')
        .map(|(dir, _)| dir)
        .unwrap_or("")
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    for segment in path_part.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                stack.pop();
            }
            other => stack.push(other),
        }
    }

    let mut path = format!("/{}", stack.join("/"));
    let ends_in_dir = path_part.ends_with('/')
        || path_part.ends_with("/.")
        || path_part.ends_with("/..")
        || path_part == "."
        || path_part == "..";
    if ends_in_dir && !path.ends_with('/') {
        path.push('/');
    }

    path.push_str(suffix);
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("http://h/admin/login.aspx").unwrap()
    }

    #[test]
    fn test_parent_relative_uses_document_directory() {
        let url = resolve_candidate("../scripts/a.js", &base()).unwrap();
        assert_eq!(url.as_str(), "http://h/scripts/a.js");
    }

    #[test]
    fn test_dot_relative() {
        let url = resolve_candidate("./users/list", &base()).unwrap();
        assert_eq!(url.as_str(), "http://h/admin/users/list");
    }

    #[test]
    fn test_bare_relative() {
        let url = resolve_candidate("settings.aspx?tab=2", &base()).unwrap();
        assert_eq!(url.as_str(), "http://h/admin/settings.aspx?tab=2");
    }

    #[test]
    fn test_pop_past_root_stays_at_root() {
        let url = resolve_candidate("../../../../x.js", &base()).unwrap();
        assert_eq!(url.as_str(), "http://h/x.js");
    }

    #[test]
    fn test_relative_from_directory_document() {
        let base = Url::parse("http://h/docs/guide/").unwrap();
        let url = resolve_candidate("../api/", &base).unwrap();
        assert_eq!(url.as_str(), "http://h/docs/api/");
    }

    #[test]
    fn test_absolute_path_joins_origin() {
        let base = Url::parse("https://example.com:8443/a/b/c").unwrap();
        let url = resolve_candidate("/api/v1/users?id=3", &base).unwrap();
        assert_eq!(url.as_str(), "https://example.com:8443/api/v1/users?id=3");
    }

    #[test]
    fn test_protocol_relative_takes_scheme() {
        let base = Url::parse("https://example.com/").unwrap();
        let url = resolve_candidate("//cdn.example.com/b.js", &base).unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.com/b.js");
    }

    #[test]
    fn test_full_url_passes_through() {
        let url = resolve_candidate("http://other.com/c?x=1", &base()).unwrap();
        assert_eq!(url.as_str(), "http://other.com/c?x=1");
    }

    #[test]
    fn test_hash_route() {
        let url = resolve_candidate("#/dashboard", &base()).unwrap();
        assert_eq!(url.as_str(), "http://h/#/dashboard");
    }

    #[test]
    fn test_plain_fragment_dropped() {
        assert!(resolve_candidate("#top", &base()).is_err());
        let url = resolve_candidate("/page#section", &base()).unwrap();
        assert_eq!(url.as_str(), "http://h/page");
    }

    #[test]
    fn test_pseudo_schemes_rejected() {
        for raw in [
            "javascript:void(0)",
            "mailto:a@b.c",
            "tel:123",
            "data:image/png;base64,AAAA",
            "about:blank",
            "blob:http://h/1",
        ] {
            assert!(resolve_candidate(raw, &base()).is_err(), "{}", raw);
        }
    }

    #[test]
    fn test_templates_and_whitespace_rejected() {
        assert!(resolve_candidate("/api/${id}", &base()).is_err());
        assert!(resolve_candidate("/a b", &base()).is_err());
        assert!(resolve_candidate("", &base()).is_err());
        assert!(resolve_candidate("   ", &base()).is_err());
    }

    #[test]
    fn test_other_schemes_rejected() {
        assert!(resolve_candidate("ftp://files.example.com/x", &base()).is_err());
    }

    #[test]
    fn test_embedded_url_in_query_kept() {
        let root = Url::parse("http://h/").unwrap();
        assert_eq!(
            resolve_candidate("/login?next=https://h/home", &root).unwrap().as_str(),
            "http://h/login?next=https://h/home"
        );

        let app = Url::parse("http://h/app/").unwrap();
        assert_eq!(
            resolve_candidate("redirect.php?to=http://x.com/", &app).unwrap().as_str(),
            "http://h/app/redirect.php?to=http://x.com/"
        );
    }

    #[test]
    fn test_query_only_keeps_document_path() {
        assert_eq!(
            resolve_candidate("?page=2", &base()).unwrap().as_str(),
            "http://h/admin/login.aspx?page=2"
        );
        let root = Url::parse("http://h/").unwrap();
        assert_eq!(
            resolve_candidate("?q=1", &root).unwrap().as_str(),
            "http://h/?q=1"
        );
    }
}
