//! Shared utilities

/// Truncate a string to `max` characters, appending "..." if truncated.
/// Operates on Unicode char boundaries, not bytes.
pub fn truncate_chars(s: &str, max: usize) -> String {
    let mut chars = s.chars();
    let truncated: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{}...", truncated)
    } else {
        truncated
    }
}

/// Parse a query source name as typed on the command line
pub fn parse_query_source(s: &str) -> Option<loan_agent::QuerySource> {
    match s.to_lowercase().replace('-', "_").as_str() {
        "router" => Some(loan_agent::QuerySource::Router),
        "search_node" | "search" => Some(loan_agent::QuerySource::SearchNode),
        _ => None,
    }
}
