//! Match normalization
//!
//! Index services return loosely typed records: ids may be numbers, scores
//! may be strings or missing, metadata may hold nested structures or sit
//! flattened beside the id. Everything downstream works on [`Match`], whose
//! metadata is keyed by [`MetadataKey`] and holds only primitive
//! [`MetadataValue`]s.

use pipelens_domain::traits::RawMatch;
use pipelens_domain::{Match, Metadata, MetadataKey, MetadataValue};
use serde_json::{Map, Value};
use tracing::debug;

/// Top-level record fields that are never metadata
const RESERVED_FIELDS: [&str; 5] = ["id", "score", "values", "sparseValues", "metadata"];

/// Normalize raw match records, preserving order
///
/// # Examples
///
/// ```
/// use pipelens_store::normalize;
/// use serde_json::json;
///
/// let raw = vec![json!({
///     "id": 7,
///     "score": "0.82",
///     "metadata": {"job_id": 42, "preview": "ERROR", "tags": ["x"], "step_name": {"a": 1}}
/// })];
/// let matches = normalize(&raw);
/// assert_eq!(matches[0].id, "7");
/// assert_eq!(matches[0].score, 0.82);
/// assert_eq!(matches[0].job_id().as_deref(), Some("42"));
/// assert_eq!(matches[0].step_name().as_deref(), Some(r#"{"a":1}"#));
/// ```
pub fn normalize(raw_matches: &[RawMatch]) -> Vec<Match> {
    raw_matches.iter().map(normalize_one).collect()
}

fn normalize_one(raw: &RawMatch) -> Match {
    let Some(record) = raw.as_object() else {
        // A bare scalar is treated as an id with no score or metadata
        return Match {
            id: coerce_id(Some(raw)),
            score: 0.0,
            metadata: Metadata::new(),
        };
    };

    Match {
        id: coerce_id(record.get("id")),
        score: coerce_score(record.get("score")),
        metadata: coerce_metadata(record),
    }
}

fn coerce_id(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn coerce_score(value: Option<&Value>) -> f64 {
    let score = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if score.is_finite() {
        score
    } else {
        0.0
    }
}

fn coerce_metadata(record: &Map<String, Value>) -> Metadata {
    let mut metadata = Metadata::new();

    let entries: Box<dyn Iterator<Item = (&String, &Value)>> = match record.get("metadata") {
        Some(Value::Object(nested)) => Box::new(nested.iter()),
        _ => Box::new(
            record
                .iter()
                .filter(|(k, _)| !RESERVED_FIELDS.contains(&k.as_str())),
        ),
    };

    for (name, value) in entries {
        let Some(key) = MetadataKey::parse(name) else {
            debug!("Dropping metadata key outside vocabulary: {}", name);
            continue;
        };
        if let Some(value) = coerce_value(value) {
            metadata.insert(key, value);
        }
    }

    metadata
}

/// Coerce a JSON value into a primitive metadata value
///
/// `null` yields `None`; arrays and objects become their compact JSON text.
pub fn coerce_value(value: &Value) -> Option<MetadataValue> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(MetadataValue::Bool(*b)),
        Value::Number(n) => Some(match n.as_f64() {
            Some(f) if f.is_finite() => MetadataValue::Number(f),
            _ => MetadataValue::Text(n.to_string()),
        }),
        Value::String(s) => Some(MetadataValue::Text(s.clone())),
        Value::Array(_) | Value::Object(_) => Some(MetadataValue::Text(value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_order_preserved() {
        let raw = vec![
            json!({"id": "b", "score": 0.1}),
            json!({"id": "a", "score": 0.9}),
        ];
        let ids: Vec<String> = normalize(&raw).into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_missing_score_defaults_to_zero() {
        let matches = normalize(&[json!({"id": "a"})]);
        assert_eq!(matches[0].score, 0.0);

        let matches = normalize(&[json!({"id": "a", "score": "not a number"})]);
        assert_eq!(matches[0].score, 0.0);

        let matches = normalize(&[json!({"id": "a", "score": null})]);
        assert_eq!(matches[0].score, 0.0);
    }

    #[test]
    fn test_id_coercion() {
        let matches = normalize(&[json!({"id": 12}), json!({"score": 1.0}), json!("bare")]);
        assert_eq!(matches[0].id, "12");
        assert_eq!(matches[1].id, "");
        assert_eq!(matches[2].id, "bare");
    }

    #[test]
    fn test_nested_values_are_stringified() {
        let raw = json!({
            "id": "a",
            "metadata": {
                "status": {"code": 1, "label": "failed"},
                "preview": ["line one", "line two"],
                "job_id": true,
            }
        });
        let m = &normalize(&[raw])[0];

        assert_eq!(
            m.metadata.get(MetadataKey::Status),
            Some(&MetadataValue::Text(r#"{"code":1,"label":"failed"}"#.to_string()))
        );
        assert_eq!(
            m.metadata.get(MetadataKey::Preview),
            Some(&MetadataValue::Text(r#"["line one","line two"]"#.to_string()))
        );
        assert_eq!(m.metadata.get(MetadataKey::JobId), Some(&MetadataValue::Bool(true)));
    }

    #[test]
    fn test_unknown_keys_and_nulls_dropped() {
        let raw = json!({
            "id": "a",
            "metadata": {"text": "full chunk text", "step_name": null, "source": "ci.log"}
        });
        let m = &normalize(&[raw])[0];
        assert_eq!(m.metadata.len(), 1);
        assert_eq!(m.metadata.text(MetadataKey::Source).as_deref(), Some("ci.log"));
    }

    #[test]
    fn test_flattened_metadata() {
        let raw = json!({
            "id": "a",
            "score": 0.5,
            "values": [0.1, 0.2],
            "job_id": "42",
            "step_name": "build"
        });
        let m = &normalize(&[raw])[0];
        assert_eq!(m.job_id().as_deref(), Some("42"));
        assert_eq!(m.step_name().as_deref(), Some("build"));
        assert_eq!(m.metadata.len(), 2);
    }

    #[test]
    fn test_empty_input() {
        assert!(normalize(&[]).is_empty());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            any::<f64>().prop_map(|f| json!(f)),
            ".*".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 16, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-z_]{1,10}", inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        /// Property: normalized metadata holds only primitive values from the vocabulary
        #[test]
        fn test_metadata_is_always_primitive(
            id in arb_json(),
            score in arb_json(),
            values in prop::collection::vec(arb_json(), 5),
        ) {
            let mut metadata = Map::new();
            for (key, value) in MetadataKey::ALL.iter().zip(values) {
                metadata.insert(key.as_str().to_string(), value);
            }
            let raw = json!({"id": id, "score": score, "metadata": metadata});

            let m = &normalize(&[raw])[0];
            prop_assert!(m.score.is_finite());

            let rendered = serde_json::to_value(&m.metadata).unwrap();
            for (name, value) in rendered.as_object().unwrap() {
                prop_assert!(MetadataKey::parse(name).is_some());
                prop_assert!(
                    value.is_boolean() || value.is_number() || value.is_string(),
                    "non-primitive value for {}: {}", name, value
                );
            }
        }
    }
}
