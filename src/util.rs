use regex::Regex;
use serde_json::Value;
use tracing::warn;

lazy_static::lazy_static! {
    /// Owner uris the hub hands out: `homey:app:...`, `homey:device:...`,
    /// `homey:manager:...`.
    pub static ref OWNER_URI_RE: Regex = Regex::new(r"^homey:(app|device|manager):\S+$").unwrap();
}

/// First `len` hex chars of a fresh UUIDv4.
pub(crate) fn short_hex(len: usize) -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    hex[..len].to_string()
}

/// Trimmed name, or a generated `Flow XXXXXXXX` placeholder when the value
/// is absent, non-string or blank. The substitution is logged, never silent.
pub(crate) fn sanitize_flow_name(raw: Option<&Value>) -> String {
    if let Some(name) = raw.and_then(Value::as_str) {
        let trimmed = name.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let fallback = format!("Flow {}", short_hex(8));
    warn!(fallback = %fallback, "flow name missing or blank, substituting generated name");
    fallback
}

/// Optional string field, trimmed, kept only when non-blank.
pub(crate) fn string_field(map: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}
