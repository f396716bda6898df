//! Per-field transforms
//!
//! Every transform takes the raw lookup result (`None` when the path could
//! not be followed) and produces the field's final JSON value. Missing or
//! null input always yields the field's default; `Err` is reserved for data
//! of a shape the transform cannot make sense of.

use serde_json::{json, Map, Number, Value};
use tracing::debug;

use crate::error::TransformError;
use crate::html::html_to_text;
use crate::node::Node;

/// Signature shared by all field transforms
pub type TransformFn = fn(Option<&Node>) -> Result<Value, TransformError>;

const MICROS_PER_UNIT: f64 = 1_000_000.0;
const MAX_COMMENTS: usize = 5;
const SCREENSHOT_URL: &[usize] = &[3, 2];
const COMMENT_TEXT: usize = 4;

/// Raw value as JSON, `null` when missing
pub fn identity(raw: Option<&Node>) -> Result<Value, TransformError> {
    Ok(raw.map(Node::to_json).unwrap_or(Value::Null))
}

/// HTML description to plain text, with `<br>` turned into line breaks
pub fn description_text(raw: Option<&Node>) -> Result<Value, TransformError> {
    match raw {
        None | Some(Node::Null) => Ok(Value::Null),
        Some(Node::String(html)) => Ok(Value::String(html_to_text(&html.replace("<br>", "\n")))),
        Some(other) => Err(TransformError::shape("string", other.kind())),
    }
}

fn price_units(raw: Option<&Node>) -> f64 {
    let micros = match raw {
        Some(Node::Number(n)) => n.as_f64(),
        Some(Node::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match micros.map(|m| m / MICROS_PER_UNIT) {
        Some(units) if units.is_finite() => units,
        _ => 0.0,
    }
}

/// Price micros to currency units; anything unusable is `0`.
/// Whole amounts are emitted as integers.
pub fn price(raw: Option<&Node>) -> Result<Value, TransformError> {
    let units = price_units(raw);
    if units.fract() == 0.0 && units.abs() < i64::MAX as f64 {
        return Ok(json!(units as i64));
    }
    Ok(Number::from_f64(units).map(Value::Number).unwrap_or(json!(0)))
}

/// `true` exactly when [`price`] of the same input is `0`
pub fn free(raw: Option<&Node>) -> Result<Value, TransformError> {
    Ok(Value::Bool(price_units(raw) == 0.0))
}

/// Display price, `"Free"` when empty or missing
pub fn price_text(raw: Option<&Node>) -> Result<Value, TransformError> {
    match raw {
        Some(node) if node.is_truthy() => Ok(node.to_json()),
        _ => Ok(Value::String("Free".to_string())),
    }
}

/// Truthiness of the raw value
pub fn boolean(raw: Option<&Node>) -> Result<Value, TransformError> {
    Ok(Value::Bool(raw.is_some_and(Node::is_truthy)))
}

/// Star rating distribution, `{"1": n, ..., "5": n}`.
///
/// Slot `i` of the container holds a pair whose second element is the count
/// for `i` stars; slot 0 is unused.
pub fn histogram(raw: Option<&Node>) -> Result<Value, TransformError> {
    let container = match raw {
        None | Some(Node::Null) => return Ok(empty_histogram()),
        Some(node @ Node::Array(_)) => node,
        Some(other) => return Err(TransformError::shape("array", other.kind())),
    };

    let mut counts = Map::new();
    for stars in 1..=5usize {
        let count = match container.at(&[stars, 1]) {
            Some(Node::Number(n)) => n.clone(),
            Some(other) => return Err(TransformError::shape("number", other.kind())),
            None => return Err(TransformError::shape("rating pair", "missing slot")),
        };
        counts.insert(stars.to_string(), Value::Number(count));
    }
    Ok(Value::Object(counts))
}

fn empty_histogram() -> Value {
    json!({"1": 0, "2": 0, "3": 0, "4": 0, "5": 0})
}

/// Seconds since the epoch to milliseconds
pub fn timestamp_millis(raw: Option<&Node>) -> Result<Value, TransformError> {
    match raw {
        None | Some(Node::Null) => Ok(Value::Null),
        Some(Node::Number(n)) => {
            if let Some(millis) = n.as_i64().and_then(|secs| secs.checked_mul(1000)) {
                return Ok(json!(millis));
            }
            let millis = n.as_f64().map(|secs| secs * 1000.0);
            Ok(millis.and_then(Number::from_f64).map(Value::Number).unwrap_or(Value::Null))
        }
        Some(other) => Err(TransformError::shape("number", other.kind())),
    }
}

/// Developer id from a developer page URL (`...?id=<value>`)
pub fn developer_id(raw: Option<&Node>) -> Result<Value, TransformError> {
    match raw {
        None | Some(Node::Null) => Ok(Value::Null),
        Some(Node::String(url)) => Ok(url
            .split_once("id=")
            .map(|(_, id)| Value::String(id.to_string()))
            .unwrap_or(Value::Null)),
        Some(other) => Err(TransformError::shape("string", other.kind())),
    }
}

/// Screenshot URLs, one per screenshot record, in page order
pub fn screenshots(raw: Option<&Node>) -> Result<Value, TransformError> {
    match raw {
        None | Some(Node::Null) => Ok(Value::Array(vec![])),
        Some(Node::Array(records)) => Ok(Value::Array(
            records
                .iter()
                .map(|record| record.at(SCREENSHOT_URL).map(Node::to_json).unwrap_or(Value::Null))
                .collect(),
        )),
        Some(other) => Err(TransformError::shape("array", other.kind())),
    }
}

/// Text of the first few comments that have one
pub fn comments(raw: Option<&Node>) -> Result<Value, TransformError> {
    let records = match raw {
        None | Some(Node::Null) => return Ok(Value::Array(vec![])),
        Some(Node::Array(records)) => records,
        Some(other) => return Err(TransformError::shape("array", other.kind())),
    };
    debug!(records = records.len(), "extracting comments");

    Ok(Value::Array(
        records
            .iter()
            .filter_map(|record| record.at(&[COMMENT_TEXT]))
            .filter(|text| !text.is_null())
            .take(MAX_COMMENTS)
            .map(Node::to_json)
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(value: Value) -> Node {
        Node::from(value)
    }

    #[test]
    fn test_identity() {
        assert_eq!(identity(None).unwrap(), Value::Null);
        assert_eq!(identity(Some(&node(json!("x")))).unwrap(), json!("x"));
        assert_eq!(identity(Some(&node(json!([1, null])))).unwrap(), json!([1, null]));
    }

    #[test]
    fn test_description_text() {
        let html = node(json!("First line<br>Second <b>bold</b> line<br><br>End &amp; more"));
        assert_eq!(
            description_text(Some(&html)).unwrap(),
            json!("First line\nSecond bold line\n\nEnd & more")
        );
        assert_eq!(description_text(None).unwrap(), Value::Null);
        assert_eq!(description_text(Some(&Node::Null)).unwrap(), Value::Null);
        assert!(description_text(Some(&node(json!([1])))).is_err());
    }

    #[test]
    fn test_price() {
        assert_eq!(price(Some(&node(json!(0)))).unwrap(), json!(0));
        assert_eq!(price(Some(&node(json!(2990000)))).unwrap(), json!(2.99));
        assert_eq!(price(Some(&node(json!(1000000)))).unwrap(), json!(1));
        assert_eq!(price(Some(&node(json!("5000000")))).unwrap(), json!(5));
        assert_eq!(price(None).unwrap(), json!(0));
        assert_eq!(price(Some(&Node::Null)).unwrap(), json!(0));
        assert_eq!(price(Some(&node(json!("n/a")))).unwrap(), json!(0));
        assert_eq!(price(Some(&node(json!([1])))).unwrap(), json!(0));
    }

    #[test]
    fn test_free_matches_price() {
        let inputs = [
            None,
            Some(Node::Null),
            Some(node(json!(0))),
            Some(node(json!(0.0))),
            Some(node(json!(990000))),
            Some(node(json!(2990000))),
            Some(node(json!("1000000"))),
            Some(node(json!("free"))),
            Some(node(json!(true))),
            Some(node(json!([0]))),
        ];
        for input in &inputs {
            let raw = input.as_ref();
            let is_zero = price(raw).unwrap() == json!(0);
            assert_eq!(free(raw).unwrap(), Value::Bool(is_zero), "input {:?}", raw);
        }
        assert_eq!(free(Some(&node(json!(0)))).unwrap(), json!(true));
        assert_eq!(free(Some(&node(json!(2990000)))).unwrap(), json!(false));
    }

    #[test]
    fn test_price_text() {
        assert_eq!(price_text(Some(&node(json!("")))).unwrap(), json!("Free"));
        assert_eq!(price_text(None).unwrap(), json!("Free"));
        assert_eq!(price_text(Some(&Node::Null)).unwrap(), json!("Free"));
        assert_eq!(price_text(Some(&node(json!("$2.99")))).unwrap(), json!("$2.99"));
    }

    #[test]
    fn test_boolean() {
        assert_eq!(boolean(None).unwrap(), json!(false));
        assert_eq!(boolean(Some(&Node::Null)).unwrap(), json!(false));
        assert_eq!(boolean(Some(&node(json!("$0.99 - $4.99 per item")))).unwrap(), json!(true));
        assert_eq!(boolean(Some(&node(json!(1)))).unwrap(), json!(true));
    }

    #[test]
    fn test_histogram_missing() {
        let zeros = json!({"1": 0, "2": 0, "3": 0, "4": 0, "5": 0});
        assert_eq!(histogram(None).unwrap(), zeros);
        assert_eq!(histogram(Some(&Node::Null)).unwrap(), zeros);
    }

    #[test]
    fn test_histogram_counts() {
        let container = node(json!([
            null,
            [null, 10],
            [null, 20],
            [null, 30],
            [null, 40],
            [null, 50]
        ]));
        assert_eq!(
            histogram(Some(&container)).unwrap(),
            json!({"1": 10, "2": 20, "3": 30, "4": 40, "5": 50})
        );
    }

    #[test]
    fn test_histogram_malformed() {
        let short = node(json!([null, [null, 1], [null, 2]]));
        assert!(histogram(Some(&short)).is_err());
        assert!(histogram(Some(&node(json!("5 stars")))).is_err());
    }

    #[test]
    fn test_timestamp_millis() {
        assert_eq!(timestamp_millis(Some(&node(json!(1700000000)))).unwrap(), json!(1700000000000i64));
        assert_eq!(timestamp_millis(Some(&node(json!(1.5)))).unwrap(), json!(1500.0));
        assert_eq!(timestamp_millis(None).unwrap(), Value::Null);
        assert!(timestamp_millis(Some(&node(json!("yesterday")))).is_err());
    }

    #[test]
    fn test_developer_id() {
        let url = node(json!("https://play.example/store/apps/dev?id=Acme"));
        assert_eq!(developer_id(Some(&url)).unwrap(), json!("Acme"));

        let no_marker = node(json!("https://play.example/store/apps/dev"));
        assert_eq!(developer_id(Some(&no_marker)).unwrap(), Value::Null);
        assert_eq!(developer_id(None).unwrap(), Value::Null);
        assert!(developer_id(Some(&node(json!(5)))).is_err());
    }

    #[test]
    fn test_screenshots() {
        assert_eq!(screenshots(Some(&Node::Null)).unwrap(), json!([]));
        assert_eq!(screenshots(None).unwrap(), json!([]));

        let records = node(json!([
            [null, null, null, [null, null, "https://img/1"]],
            [null, null, null, [null, null, "https://img/2"]],
            [null, null, null, [null, null, "https://img/3"]]
        ]));
        assert_eq!(
            screenshots(Some(&records)).unwrap(),
            json!(["https://img/1", "https://img/2", "https://img/3"])
        );
    }

    #[test]
    fn test_comments_filters_and_truncates() {
        let records: Vec<Value> = (0..7)
            .map(|i| {
                let text = if i == 2 || i == 5 {
                    Value::Null
                } else {
                    json!(format!("comment {}", i))
                };
                json!(["id", "author", null, 5, text])
            })
            .collect();
        let raw = node(Value::Array(records));

        assert_eq!(
            comments(Some(&raw)).unwrap(),
            json!(["comment 0", "comment 1", "comment 3", "comment 4", "comment 6"])
        );
    }

    #[test]
    fn test_comments_missing_and_short_records() {
        assert_eq!(comments(None).unwrap(), json!([]));
        assert_eq!(comments(Some(&Node::Null)).unwrap(), json!([]));

        let raw = node(json!([["too", "short"], [0, 0, 0, 0, "kept"]]));
        assert_eq!(comments(Some(&raw)).unwrap(), json!(["kept"]));
        assert!(comments(Some(&node(json!("nope")))).is_err());
    }
}
