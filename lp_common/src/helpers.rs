use std::{str::FromStr, time::Duration};

/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Parse a strictly positive number from a string value. Missing, malformed, or zero values yield `None`, so that the
/// caller can decide which default to log and apply.
pub fn parse_positive<T>(value: Option<String>) -> Option<T>
where T: FromStr + PartialOrd + Default {
    value.and_then(|v| v.trim().parse::<T>().ok()).filter(|v| *v > T::default())
}

/// Parse a whole number of seconds into a [`Duration`].
pub fn parse_seconds(value: Option<String>) -> Option<Duration> {
    parse_positive::<u64>(value).map(Duration::from_secs)
}
