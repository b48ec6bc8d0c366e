//! Console rendering of page results

use crate::crawler::{FetchStatus, PageResult};
use colored::{ColoredString, Colorize};

/// Titles longer than this are shortened on the console
const MAX_TITLE_CHARS: usize = 50;

/// Renders one result line
///
/// Layout: depth, status, length, type tag, title, URL, elapsed time and a
/// sensitive-content summary when anything was found.
pub fn format_line(result: &PageResult) -> String {
    let mut line = format!(
        "[{}] {} {:>8} {:<5} {} {} {}",
        result.depth,
        status_label(&result.status),
        result.length,
        result.content_type,
        shorten(&result.title).bold(),
        result.url.as_str().underline(),
        format!("{}ms", result.elapsed.as_millis()).dimmed(),
    );

    if result.has_findings() {
        let summary = result
            .findings
            .iter()
            .map(|f| format!("{}x{}", f.pattern_name, f.unique_match_count))
            .collect::<Vec<_>>()
            .join(", ");
        line.push_str(&format!(" {}", format!("[!] {}", summary).red().bold()));
    }

    if result.is_duplicate {
        line.push_str(&format!(" {}", "(duplicate)".dimmed()));
    }

    line
}

/// Prints one result line to stdout
pub fn print_result(result: &PageResult) {
    println!("{}", format_line(result));
}

/// Prints a marker line for an appendix URL
pub fn print_marker(url: &str, status: &str) {
    println!("{} {}", status.yellow().bold(), url);
}

fn status_label(status: &FetchStatus) -> ColoredString {
    let text = format!("{:>15}", status.to_string());
    match status {
        FetchStatus::Code(code) if (200..300).contains(code) => text.green(),
        FetchStatus::Code(code) if (300..400).contains(code) => text.cyan(),
        FetchStatus::Code(code) if (400..500).contains(code) => text.yellow(),
        FetchStatus::Code(_) => text.red(),
        FetchStatus::Error(_) => text.magenta(),
    }
}

fn shorten(title: &str) -> String {
    if title.chars().count() <= MAX_TITLE_CHARS {
        title.to_string()
    } else {
        let cut: String = title.chars().take(MAX_TITLE_CHARS).collect();
        format!("{}...", cut)
    }
}
