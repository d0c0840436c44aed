/// Get environment variable with STAFFGATE_ prefix, falling back to unprefixed version
///
/// Checks `STAFFGATE_{key}` first, then `{key}`.
///
/// # Examples
///
/// ```rust,ignore
/// // Checks STAFFGATE_ACCESS_FILE first, then ACCESS_FILE
/// let path = get_env_with_prefix("ACCESS_FILE");
/// ```
pub fn get_env_with_prefix(key: &str) -> Option<String> {
    std::env::var(format!("STAFFGATE_{}", key))
        .or_else(|_| std::env::var(key))
        .ok()
}

/// Parse a boolean flag from the environment, ignoring unparseable values.
pub fn get_env_flag(key: &str) -> Option<bool> {
    get_env_with_prefix(key).and_then(|v| match v.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    })
}
