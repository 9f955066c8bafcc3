const MAX_VISIBLE_CHARS: usize = 100;

/// Sanitizes user text for safe logging: truncates long input and masks
/// credential-looking values.
pub fn sanitize_prompt(prompt: &str) -> String {
    let trimmed = prompt.trim();

    if trimmed.is_empty() {
        return String::from("[EMPTY]");
    }

    let total_chars = trimmed.chars().count();
    let sanitized = if total_chars > MAX_VISIBLE_CHARS {
        let visible: String = trimmed.chars().take(MAX_VISIBLE_CHARS).collect();
        format!("{}... ({} chars total)", visible, total_chars)
    } else {
        trimmed.to_string()
    };

    redact_sensitive_patterns(&sanitized)
}

fn redact_sensitive_patterns(text: &str) -> String {
    const PATTERNS: [&str; 5] = ["Bearer ", "api_key=", "password=", "secret=", "token="];

    let mut result = text.to_string();
    for pattern in PATTERNS {
        let mut search_from = 0;
        while let Some(found) = result[search_from..].find(pattern) {
            let value_start = search_from + found + pattern.len();
            let value_end = result[value_start..]
                .find(|c: char| c.is_whitespace() || c == '&' || c == '"' || c == '\'')
                .map(|i| value_start + i)
                .unwrap_or(result.len());
            result.replace_range(value_start..value_end, "[REDACTED]");
            search_from = value_start + "[REDACTED]".len();
        }
    }

    result
}
