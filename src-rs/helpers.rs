use std::env;
use std::str::FromStr;

pub fn env_opt(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(value.trim().to_string()),
        _ => None,
    }
}

pub fn env_parse<T: FromStr>(key: &str, fallback: T) -> T {
    env_opt(key)
        .and_then(|raw| raw.parse::<T>().ok())
        .unwrap_or(fallback)
}

/// Makes a file name safe to place inside a quoted `Content-Disposition`
/// value and never names a directory. Empty names fall back to
/// `download.pdf`.
pub fn attachment_filename(original: &str) -> String {
    if original.is_empty() {
        return "download.pdf".to_string();
    }
    original
        .chars()
        .map(|c| {
            if matches!(c, '"' | '\\' | '/') || !(c.is_ascii_graphic() || c == ' ') {
                '_'
            } else {
                c
            }
        })
        .collect()
}
