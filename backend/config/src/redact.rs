//! Config redaction: produce safe-to-share config snapshots by masking secrets.

use serde_json::Value;

/// Keys whose string values are secrets.
static SECRET_KEYS: &[&str] = &[
    "apiKey",
    "api_key",
    "token",
    "accessToken",
    "secret",
    "password",
];

/// Redact a config JSON value, masking every secret field.
///
/// Keeps the first four characters as a hint when the secret is long enough
/// for that not to give it away.
pub fn redact(value: &Value) -> Value {
    redact_under(value, "")
}

fn is_secret_key(key: &str) -> bool {
    SECRET_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

fn mask(secret: &str) -> String {
    if secret.chars().count() > 12 {
        format!("{}***", secret.chars().take(4).collect::<String>())
    } else {
        "***".to_string()
    }
}

fn redact_under(value: &Value, key: &str) -> Value {
    match value {
        Value::String(s) if is_secret_key(key) && !s.is_empty() => Value::String(mask(s)),
        Value::Array(items) => Value::Array(items.iter().map(|v| redact_under(v, key)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), redact_under(v, k)))
                .collect(),
        ),
        other => other.clone(),
    }
}
