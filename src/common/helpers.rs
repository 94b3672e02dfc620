// Helper functions for serialization and logging

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer};

/// Deserializes a backend-assigned identifier that may arrive as a JSON
/// string or a JSON number. Identifiers are opaque, so both become strings.
pub fn deserialize_opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Text(text) if text.trim().is_empty() => {
            Err(de::Error::custom("identifier must not be empty"))
        }
        RawId::Text(text) => Ok(text),
        RawId::Number(number) => Ok(number.to_string()),
    }
}

/// Optional variant of [`deserialize_opaque_id`].
pub fn deserialize_optional_opaque_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "deserialize_opaque_id")] String);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|Wrapper(id)| id))
}

/// Parses a timestamp as sent by the backend. RFC 3339 values are accepted
/// as-is; naive ISO-8601 values (no offset) are taken to be UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

pub fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {}", raw)))
}

/// Shortens free text for log lines.
pub fn preview_for_log(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
