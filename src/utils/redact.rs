use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;

const DEFAULT_REDACTION: &str = "[REDACTED]";
const INLINE_REDACTION: &str = "***REDACTED***";

static SENSITIVE_HEADER_KEYS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "authorization",
        "proxy-authorization",
        "cookie",
        "set-cookie",
        "x-api-key",
        "x-auth-token",
        "x-access-token",
    ]
    .into_iter()
    .collect()
});

static INLINE_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"\b(Bearer|Basic)\s+([A-Za-z0-9._~+/=-]{6,})").expect("auth scheme regex"),
            "$1 ***REDACTED***",
        ),
        (
            Regex::new(r#""(access_token|refresh_token|id_token|client_secret|password)"\s*:\s*"[^"]*""#)
                .expect("json secret regex"),
            "\"$1\":\"***REDACTED***\"",
        ),
        (
            Regex::new(r"\b(access_token|refresh_token|client_secret|password)=([^&\s]+)")
                .expect("form secret regex"),
            "$1=***REDACTED***",
        ),
        (
            Regex::new(r"\beyJ[a-zA-Z0-9_-]{10,}\.[a-zA-Z0-9_-]{10,}\.[a-zA-Z0-9_-]{10,}\b")
                .expect("jwt regex"),
            INLINE_REDACTION,
        ),
    ]
});

pub fn is_sensitive_header(name: &str) -> bool {
    let normalized = name.trim().to_lowercase();
    SENSITIVE_HEADER_KEYS.contains(normalized.as_str())
        || normalized.contains("token")
        || normalized.contains("secret")
}

fn truncate_utf8(value: &str, max_bytes: usize) -> String {
    if value.len() <= max_bytes {
        return value.to_string();
    }
    let mut end = max_bytes;
    while end > 0 && !value.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &value[..end])
}

/// Masks credentials embedded in free text and caps it at `max_bytes`.
pub fn redact_text(value: &str, max_bytes: usize) -> String {
    let mut out = value.to_string();
    for (re, replacement) in INLINE_PATTERNS.iter() {
        if re.is_match(&out) {
            out = re.replace_all(&out, *replacement).to_string();
        }
    }
    truncate_utf8(&out, max_bytes)
}

/// Header pairs as a JSON object suitable for log metadata.
pub fn redact_header_pairs<'a, I>(pairs: I) -> Value
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut out = serde_json::Map::new();
    for (name, value) in pairs {
        let rendered = if is_sensitive_header(name) {
            DEFAULT_REDACTION.to_string()
        } else {
            redact_text(value, 256)
        };
        out.insert(name.to_string(), Value::String(rendered));
    }
    Value::Object(out)
}

/// Replaces the value of any query parameter that looks like a credential.
pub fn redact_url(raw: &str) -> String {
    let Ok(mut parsed) = url::Url::parse(raw) else {
        return redact_text(raw, 2048);
    };
    if parsed.query().is_none() {
        return raw.to_string();
    }
    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| {
            let lowered = k.to_lowercase();
            let masked = lowered.contains("key")
                || lowered.contains("token")
                || lowered.contains("secret")
                || lowered == "password";
            let value = if masked {
                DEFAULT_REDACTION.to_string()
            } else {
                v.to_string()
            };
            (k.to_string(), value)
        })
        .collect();
    parsed.query_pairs_mut().clear().extend_pairs(pairs);
    parsed.to_string()
}
