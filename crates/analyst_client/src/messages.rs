//! JSON bodies exchanged with the Auto Analyst backend.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Client → server: `/login` and `/register` body.
#[derive(Debug, Clone, Serialize)]
pub struct CredentialsBody<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Client → server: `/query` body.
#[derive(Debug, Clone, Serialize)]
pub struct QueryBody<'a> {
    pub query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_key: Option<&'a str>,
}

/// Server → client: successful `/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenBody {
    pub access_token: String,
}

/// Server → client: the `{message}` envelope used by every endpoint except
/// `/results`. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MessageBody {
    #[serde(default)]
    pub message: Option<String>,
    /// Set by the backend on internal failures instead of `message`.
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub file_key: Option<String>,
    #[serde(default)]
    pub result_key: Option<String>,
}

/// Render one result record the way the results list shows it: compact JSON,
/// keys in response order. Integral floats print without a fraction
/// (`1.0` as `1`, `1e2` as `100`), matching a browser's `JSON.stringify`.
pub fn render_record(record: &Value) -> String {
    let mut record = record.clone();
    drop_integral_fractions(&mut record);
    record.to_string()
}

// Beyond i64 the float form is kept.
fn drop_integral_fractions(value: &mut Value) {
    match value {
        Value::Number(n) if n.is_f64() => {
            if let Some(f) = n.as_f64() {
                if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                    *n = Number::from(f as i64);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(drop_integral_fractions),
        Value::Object(map) => map.values_mut().for_each(drop_integral_fractions),
        _ => {}
    }
}
