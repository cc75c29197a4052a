//! Operator-friendly layout for captured backtraces.

use regex::Regex;
use std::sync::LazyLock;

pub const NO_STACK_TRACE: &str = "No stack trace available";

/// `  12: cedar_api::api::handler`
static FRAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\d+:\s+(.+?)\s*$").unwrap());

/// `at ./src/api/mod.rs:42:9`
static LOCATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*at\s+(.+):(\d+):(\d+)\s*$").unwrap());

/// Rewrites a `std::backtrace::Backtrace` rendering for email.
///
/// The first line is `message`. Each frame with a source location becomes a
/// block of `→ function`, `File`, `Line`, `Column` and `Path`; any other line
/// is copied through trimmed.
pub fn format_stack_trace(message: &str, backtrace: Option<&str>) -> String {
    let Some(backtrace) = backtrace.filter(|trace| !trace.trim().is_empty()) else {
        return NO_STACK_TRACE.to_string();
    };

    let mut formatted = format!("{message}\n");
    let mut lines = backtrace.lines().peekable();

    while let Some(line) = lines.next() {
        let Some(frame) = FRAME.captures(line) else {
            if !line.trim().is_empty() {
                formatted.push_str(line.trim());
                formatted.push('\n');
            }
            continue;
        };

        let location = lines.peek().and_then(|next| LOCATION.captures(next));
        match location {
            Some(location) => {
                let path = &location[1];
                let file = path.rsplit(['/', '\\']).next().unwrap_or(path);
                formatted.push_str(&format!("→ {}\n", &frame[1]));
                formatted.push_str(&format!("  File: {file}\n"));
                formatted.push_str(&format!("  Line: {}\n", &location[2]));
                formatted.push_str(&format!("  Column: {}\n", &location[3]));
                formatted.push_str(&format!("  Path: {path}\n\n"));
                lines.next();
            }
            None => {
                formatted.push_str(line.trim());
                formatted.push('\n');
            }
        }
    }

    formatted
}
