/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format a 0-10 vote average as "7.9/10"; unrated movies show "-"
pub fn format_rating(vote_average: f64, vote_count: u64) -> String {
    if vote_count == 0 {
        "-".to_string()
    } else {
        format!("{:.1}/10", vote_average)
    }
}

/// Compact vote count: 950, 7.2k, 1.3M
pub fn format_votes(count: u64) -> String {
    match count {
        0..=999 => count.to_string(),
        1_000..=999_999 => format!("{:.1}k", count as f64 / 1_000.0),
        _ => format!("{:.1}M", count as f64 / 1_000_000.0),
    }
}
