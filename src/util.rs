pub const API_URL: &str = "HOSTWATCH_API_URL";

pub const API_TOKEN: &str = "HOSTWATCH_API_TOKEN";

pub const REFRESH_INTERVAL: &str = "HOSTWATCH_REFRESH_INTERVAL";

const LOG_FILTER: &str = "HOSTWATCH_LOG";

/// Log level requested through the environment, if it parses
pub fn get_log_level() -> Option<tracing::Level> {
    let level_from_env = std::env::var(LOG_FILTER);
    level_from_env.ok().and_then(|res| res.parse().ok())
}

/// Truncate `text` to `max` characters, marking the cut with an ellipsis
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }

    let mut truncated: String = text.chars().take(max.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}
