// flightdesk-core/src/utils.rs
//! Small string helpers shared by the API clients and front-ends.

/// Shortens `input` to at most `max_chars` characters, ending in `...` when
/// anything was cut. Counts characters, not bytes.
pub fn truncate_string(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        return input.to_string();
    }
    if max_chars < 3 {
        return input.chars().take(max_chars).collect();
    }
    let kept: String = input.chars().take(max_chars - 3).collect();
    format!("{}...", kept)
}

/// First line of `input`, truncated, for single-line log fields and previews.
pub fn one_line_preview(input: &str, max_chars: usize) -> String {
    let first = input.lines().next().unwrap_or("").trim();
    let preview = truncate_string(first, max_chars);
    if input.trim().lines().nth(1).is_some() && !preview.ends_with("...") {
        format!("{}...", preview)
    } else {
        preview
    }
}
