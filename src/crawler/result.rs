//! Page result construction
//!
//! Turns a fetch outcome into an immutable [`PageResult`], decoding the body
//! with the best charset available and running sensitive-content detection.

use super::fetcher::{ErrorKind, FetchError, FetchResponse};
use crate::sensitive::{SensitiveDetector, SensitiveFinding};
use chardetng::EncodingDetector;
use encoding_rs::{Encoding, GBK, UTF_8, WINDOWS_1252};
use once_cell::sync::Lazy;
use regex::bytes::Regex as BytesRegex;
use regex::Regex;
use scraper::{Html, Selector};
use std::fmt;
use std::time::Duration;
use url::Url;

/// How much of the body is searched for a `<meta charset>` declaration
const META_SNIFF_BYTES: usize = 4096;

static META_CHARSET: Lazy<BytesRegex> = Lazy::new(|| {
    BytesRegex::new(r#"(?i-u)<meta[^>]+charset\s*=\s*["']?\s*([A-Za-z0-9_:.-]+)"#).unwrap()
});

static TITLE: Lazy<BytesRegex> =
    Lazy::new(|| BytesRegex::new(r"(?is-u)<title[^>]*>(.*?)</title\s*>").unwrap());

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());

/// Status of a page: an HTTP code or a fetch failure family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchStatus {
    Code(u16),
    Error(ErrorKind),
}

impl FetchStatus {
    pub fn code(&self) -> Option<u16> {
        match self {
            Self::Code(code) => Some(*code),
            Self::Error(_) => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => write!(f, "{}", code),
            Self::Error(kind) => f.write_str(kind.status_tag()),
        }
    }
}

/// Everything known about one fetched URL
#[derive(Debug, Clone)]
pub struct PageResult {
    /// URL after redirects
    pub url: Url,
    /// URL that was requested
    pub original_url: Url,
    pub status: FetchStatus,
    pub title: String,
    /// Body size in bytes
    pub length: usize,
    pub redirects: Vec<String>,
    pub elapsed: Duration,
    /// Short content tag (`html`, `js`, `json`, ...)
    pub content_type: String,
    pub findings: Vec<SensitiveFinding>,
    pub depth: u32,
    pub is_duplicate: bool,
}

impl PageResult {
    /// Returns the result tagged as a repeated sighting
    pub fn with_duplicate(mut self, is_duplicate: bool) -> Self {
        self.is_duplicate = is_duplicate;
        self
    }

    pub fn has_findings(&self) -> bool {
        !self.findings.is_empty()
    }
}

/// A built result plus the decoded body used for link extraction
#[derive(Debug, Clone)]
pub struct BuiltPage {
    pub result: PageResult,
    /// Decoded body; `None` for failed fetches and binary content
    pub text: Option<String>,
}

/// Builds the result for one fetched URL
///
/// Never fails: a failed fetch yields an error-tagged result with zero
/// length and no extraction text.
///
/// # Arguments
///
/// * `original_url` - The URL that was requested
/// * `outcome` - The response, or the error after retries
/// * `depth` - Depth of the work item
/// * `detector` - Sensitive content scanner run over the decoded body
pub fn build_result(
    original_url: &Url,
    outcome: Result<FetchResponse, FetchError>,
    depth: u32,
    detector: &SensitiveDetector,
) -> BuiltPage {
    let response = match outcome {
        Ok(response) => response,
        Err(error) => {
            return BuiltPage {
                result: PageResult {
                    url: original_url.clone(),
                    original_url: original_url.clone(),
                    status: FetchStatus::Error(error.kind),
                    title: String::new(),
                    length: 0,
                    redirects: Vec::new(),
                    elapsed: Duration::ZERO,
                    content_type: String::new(),
                    findings: Vec::new(),
                    depth,
                    is_duplicate: false,
                },
                text: None,
            };
        }
    };

    let mime = response.content_type().unwrap_or("").to_ascii_lowercase();
    let content_type = content_type_tag(&mime, &response.final_url);

    let (title, text) = if is_textual(&mime) {
        let declared = declared_encoding(&mime, &response.body);
        let text = decode_body(&response.body, declared);
        (extract_title(&response.body, declared), Some(text))
    } else {
        (String::new(), None)
    };

    let findings = text
        .as_deref()
        .map(|t| detector.scan(t))
        .unwrap_or_default();

    BuiltPage {
        result: PageResult {
            url: response.final_url,
            original_url: original_url.clone(),
            status: FetchStatus::Code(response.status),
            title,
            length: response.body.len(),
            redirects: response.redirects,
            elapsed: response.elapsed,
            content_type,
            findings,
            depth,
            is_duplicate: false,
        },
        text,
    }
}

/// Returns false for media types that are never worth decoding
fn is_textual(mime: &str) -> bool {
    let binary_prefixes = ["image/", "audio/", "video/", "font/"];
    let binary_types = [
        "application/octet-stream",
        "application/pdf",
        "application/zip",
        "application/x-font",
        "application/vnd.ms-fontobject",
    ];
    !binary_prefixes.iter().any(|p| mime.starts_with(p))
        && !binary_types.iter().any(|t| mime.starts_with(t))
}

/// Short tag for the console type column
fn content_type_tag(mime: &str, url: &Url) -> String {
    let essence = mime.split(';').next().unwrap_or("").trim();
    let tag = match essence {
        "" => return extension_tag(url),
        m if m.contains("html") => "html",
        m if m.contains("javascript") || m.contains("ecmascript") => "js",
        m if m.contains("json") => "json",
        m if m.contains("css") => "css",
        m if m.contains("xml") => "xml",
        m if m.starts_with("text/") => "text",
        m if m.starts_with("image/") => "image",
        m => m.rsplit('/').next().unwrap_or(m),
    };
    tag.to_string()
}

fn extension_tag(url: &Url) -> String {
    let path = url.path();
    match path.rsplit_once('.') {
        Some((_, ext)) if !ext.contains('/') && ext.len() <= 5 => ext.to_ascii_lowercase(),
        _ => "unknown".to_string(),
    }
}

/// Charset declared by the Content-Type header, else by a `<meta>` tag
fn declared_encoding(mime: &str, body: &[u8]) -> Option<&'static Encoding> {
    let from_header = mime.split(';').find_map(|part| {
        let (key, value) = part.split_once('=')?;
        (key.trim() == "charset")
            .then(|| Encoding::for_label(value.trim().trim_matches('"').as_bytes()))
            .flatten()
    });

    from_header.or_else(|| {
        let head = &body[..body.len().min(META_SNIFF_BYTES)];
        META_CHARSET
            .captures(head)
            .and_then(|c| c.get(1))
            .and_then(|m| Encoding::for_label(m.as_bytes()))
    })
}

fn detect_encoding(body: &[u8]) -> &'static Encoding {
    let mut detector = EncodingDetector::new();
    detector.feed(body, true);
    detector.guess(None, true)
}

/// Decodes the body: declared charset, then detection, then lossy UTF-8
fn decode_body(body: &[u8], declared: Option<&'static Encoding>) -> String {
    if let Some(encoding) = declared {
        let (text, _, had_errors) = encoding.decode(body);
        if !had_errors {
            return text.into_owned();
        }
    }

    if let Ok(text) = std::str::from_utf8(body) {
        return text.to_string();
    }

    let (text, _, had_errors) = detect_encoding(body).decode(body);
    if !had_errors {
        return text.into_owned();
    }

    String::from_utf8_lossy(body).into_owned()
}

/// Extracts the page title, trying several decodings of its raw bytes
///
/// Candidates are tried in order: declared charset, UTF-8, detected
/// charset, GBK, windows-1252. The first decoding without errors wins,
/// not the longest one: windows-1252 never reports errors and always yields
/// the longest text, so "longest" would pick mojibake for multi-byte titles.
/// Pages that lie about their charset still get a readable title this way.
fn extract_title(body: &[u8], declared: Option<&'static Encoding>) -> String {
    let raw = match TITLE.captures(body).and_then(|c| c.get(1)) {
        Some(m) => m.as_bytes(),
        None => return String::new(),
    };

    let mut candidates: Vec<&'static Encoding> = Vec::with_capacity(5);
    for encoding in declared
        .into_iter()
        .chain([UTF_8, detect_encoding(body), GBK, WINDOWS_1252])
    {
        if !candidates.contains(&encoding) {
            candidates.push(encoding);
        }
    }

    candidates
        .iter()
        .find_map(|encoding| {
            let (text, _, had_errors) = encoding.decode(raw);
            (!had_errors).then(|| clean_title(&text))
        })
        .unwrap_or_else(|| clean_title(&String::from_utf8_lossy(raw)))
}

/// Decodes entities through the HTML parser and collapses whitespace
fn clean_title(raw: &str) -> String {
    let document = Html::parse_document(&format!("<title>{}</title>", raw));
    let text: String = document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|title| title.text().collect())
        .unwrap_or_default();
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}
