//! Link candidate extraction
//!
//! Three layers run over every document and their output is unioned:
//!
//! 1. A literal scan for quoted strings in attribute, call and CSS contexts
//! 2. An HTML attribute pass over the parsed DOM
//! 3. A bundler-chunk heuristic rebuilding lazily loaded script names
//!
//! The layers overlap on purpose; whatever one misses another usually
//! catches, and the strict filtering happens later in classification.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

static ATTRIBUTE_LITERALS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\b(?:href|src|action|data-src|data-url|poster)\s*=\s*["'`]([^"'`<>]+)["'`]"#)
        .unwrap()
});

static CALL_LITERALS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)(?:\bfetch|\baxios(?:\.(?:get|post|put|delete|patch|request))?|\$\.(?:get|post|ajax)|\brouter\.(?:push|replace)|\bnavigate|\bwindow\.open|\bimport)\s*\(\s*["'`]([^"'`]+)["'`]"#,
    )
    .unwrap()
});

static LOCATION_ASSIGNMENTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)location\.href\s*=\s*["'`]([^"'`]+)["'`]"#).unwrap());

static CSS_URLS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)url\(\s*["']?([^"')\s]+)["']?\s*\)"#).unwrap());

static QUOTED_ABSOLUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"["'`]((?:https?:)?//[^"'`\s<>\\]+)["'`]"#).unwrap());

static QUOTED_PATHS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"["'`]((?:/|\./|\.\./)[A-Za-z0-9_\-./?=&%#~+:@!$,;]*)["'`]"#).unwrap()
});

static CHUNK_MAP_ENTRIES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""chunk-([0-9A-Za-z]+)"\s*:\s*"([0-9A-Za-z]+)""#).unwrap()
});

/// Tag and attribute pairs read by the DOM pass
const ATTRIBUTE_TARGETS: &[(&str, &str)] = &[
    ("a", "href"),
    ("link", "href"),
    ("script", "src"),
    ("img", "src"),
    ("img", "data-src"),
    ("iframe", "src"),
    ("frame", "src"),
    ("form", "action"),
    ("source", "src"),
    ("video", "src"),
    ("video", "poster"),
    ("audio", "src"),
    ("embed", "src"),
    ("object", "data"),
    ("area", "href"),
    ("input", "src"),
    ("track", "src"),
    ("button", "formaction"),
    ("blockquote", "cite"),
    ("q", "cite"),
];

static ATTRIBUTE_SELECTORS: Lazy<Vec<(Selector, &'static str)>> = Lazy::new(|| {
    ATTRIBUTE_TARGETS
        .iter()
        .filter_map(|(tag, attr)| {
            Selector::parse(&format!("{}[{}]", tag, attr))
                .ok()
                .map(|selector| (selector, *attr))
        })
        .collect()
});

static META_SELECTOR: Lazy<Option<Selector>> =
    Lazy::new(|| Selector::parse("meta[http-equiv][content]").ok());

/// Collects raw link candidates from literal patterns and the HTML DOM
///
/// Candidates are returned unresolved, deduplicated in first-seen order.
pub fn extract_candidates(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    let mut push = |value: &str| {
        let value = value.trim();
        if !value.is_empty() && seen.insert(value.to_string()) {
            candidates.push(value.to_string());
        }
    };

    for pattern in [
        &*ATTRIBUTE_LITERALS,
        &*CALL_LITERALS,
        &*LOCATION_ASSIGNMENTS,
        &*CSS_URLS,
        &*QUOTED_ABSOLUTE,
        &*QUOTED_PATHS,
    ] {
        for captures in pattern.captures_iter(content) {
            if let Some(m) = captures.get(1) {
                push(m.as_str());
            }
        }
    }

    if content.contains('<') {
        for value in extract_from_dom(content) {
            push(&value);
        }
    }

    candidates
}

/// Reads link-bearing attributes from the parsed document
fn extract_from_dom(content: &str) -> Vec<String> {
    let document = Html::parse_document(content);
    let mut values = Vec::new();

    for (selector, attr) in ATTRIBUTE_SELECTORS.iter() {
        for element in document.select(selector) {
            if let Some(value) = element.value().attr(attr) {
                values.push(value.to_string());
            }
        }
    }

    if let Some(selector) = META_SELECTOR.as_ref() {
        for element in document.select(selector) {
            let is_refresh = element
                .value()
                .attr("http-equiv")
                .is_some_and(|v| v.eq_ignore_ascii_case("refresh"));
            if !is_refresh {
                continue;
            }
            if let Some(target) = element.value().attr("content").and_then(refresh_target) {
                values.push(target.to_string());
            }
        }
    }

    values
}

/// Pulls the target out of a `<meta http-equiv="refresh" content="5; url=/next">`
fn refresh_target(content: &str) -> Option<&str> {
    let lower = content.to_ascii_lowercase();
    let idx = lower.find("url=")?;
    let target = content[idx + 4..].trim().trim_matches(|c| c == '\'' || c == '"');
    (!target.is_empty()).then_some(target)
}

/// Rebuilds lazily loaded chunk URLs from a bundler's chunk map
///
/// Entries of the form `"chunk-<hash>":"<hash>"` become
/// `<static-root>chunk-<hash>.<hash>.js`. The static root is the `/js/`
/// directory of the current document when its path has one, otherwise
/// `<origin>/js/`.
pub fn chunk_candidates(content: &str, base: &Url) -> Vec<String> {
    if !content.contains("\"chunk-") {
        return Vec::new();
    }

    let root = static_root(base);
    let mut seen = HashSet::new();

    CHUNK_MAP_ENTRIES
        .captures_iter(content)
        .map(|c| format!("{}chunk-{}.{}.js", root, &c[1], &c[2]))
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

fn static_root(base: &Url) -> String {
    let origin = base.origin().ascii_serialization();
    let path = base.path();

    match path.find("/js/") {
        Some(idx) => format!("{}{}", origin, &path[..idx + 4]),
        None => format!("{}/js/", origin),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_literals() {
        let html = r#"<a href="/a">A</a><img src='/logo.png'><form action="./submit"></form>"#;
        let candidates = extract_candidates(html);
        assert!(candidates.contains(&"/a".to_string()));
        assert!(candidates.contains(&"/logo.png".to_string()));
        assert!(candidates.contains(&"./submit".to_string()));
    }

    #[test]
    fn test_call_patterns() {
        let js = r#"
            fetch("/api/users");
            axios.post('/api/login', body);
            $.ajax("/legacy/endpoint");
            router.push(`/dashboard`);
            import("./lazy.js");
            window.open("https://other.com/popup");
            location.href = "/after";
        "#;
        let candidates = extract_candidates(js);
        for expected in [
            "/api/users",
            "/api/login",
            "/legacy/endpoint",
            "/dashboard",
            "./lazy.js",
            "https://other.com/popup",
            "/after",
        ] {
            assert!(candidates.contains(&expected.to_string()), "{}", expected);
        }
    }

    #[test]
    fn test_css_urls() {
        let css = "body { background: url(../img/bg.jpg); } .x { background: url('/a.css') }";
        let candidates = extract_candidates(css);
        assert!(candidates.contains(&"../img/bg.jpg".to_string()));
        assert!(candidates.contains(&"/a.css".to_string()));
    }

    #[test]
    fn test_protocol_relative_literal() {
        let html = r#"<a href="//cdn.example.com/b.js">b</a>"#;
        let candidates = extract_candidates(html);
        assert!(candidates.contains(&"//cdn.example.com/b.js".to_string()));
    }

    #[test]
    fn test_dom_pass_catches_unquoted_attributes() {
        let html = "<html><body><a href=/unquoted>x</a><iframe src=/frame></iframe></body></html>";
        let candidates = extract_candidates(html);
        assert!(candidates.contains(&"/unquoted".to_string()));
        assert!(candidates.contains(&"/frame".to_string()));
    }

    #[test]
    fn test_meta_refresh() {
        let html = r#"<html><head><meta http-equiv="Refresh" content="0; url=/next"></head></html>"#;
        let candidates = extract_candidates(html);
        assert!(candidates.contains(&"/next".to_string()));
    }

    #[test]
    fn test_candidates_deduplicated_in_order() {
        let html = r#"<a href="/a">1</a><a href="/a">2</a><a href="/b">3</a>"#;
        let candidates = extract_candidates(html);
        assert_eq!(candidates.iter().filter(|c| *c == "/a").count(), 1);
        let a = candidates.iter().position(|c| c == "/a").unwrap();
        let b = candidates.iter().position(|c| c == "/b").unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_chunk_heuristic_uses_document_js_dir() {
        let base = Url::parse("https://example.com/static/js/app.1234.js").unwrap();
        let js = r#"{"chunk-3f2a1b":"9c8d7e6f","chunk-0aa1":"bb22"}"#;
        let chunks = chunk_candidates(js, &base);
        assert_eq!(
            chunks,
            vec![
                "https://example.com/static/js/chunk-3f2a1b.9c8d7e6f.js".to_string(),
                "https://example.com/static/js/chunk-0aa1.bb22.js".to_string(),
            ]
        );
    }

    #[test]
    fn test_chunk_heuristic_falls_back_to_origin_js() {
        let base = Url::parse("https://example.com/index.html").unwrap();
        let chunks = chunk_candidates(r#""chunk-abc123":"def456""#, &base);
        assert_eq!(chunks, vec!["https://example.com/js/chunk-abc123.def456.js".to_string()]);
    }

    #[test]
    fn test_no_chunks() {
        let base = Url::parse("https://example.com/").unwrap();
        assert!(chunk_candidates("var x = 1;", &base).is_empty());
    }
}
