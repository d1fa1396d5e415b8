//! Dynamic property values and their type-directed blending.
//!
//! Component props are schemaless: anything that serializes to JSON can be
//! stored and keyframed. Blending picks a strategy from the shapes of the
//! two endpoints and degrades to a step function whenever the shapes do not
//! line up.

use serde_json::{Map, Value};

/// A single component property value.
pub type PropValue = Value;

/// Named props of a single component.
pub type PropMap = std::collections::BTreeMap<String, PropValue>;

/// Step function: `a` for the first half of the segment, `b` from the midpoint on.
pub fn step(a: &PropValue, b: &PropValue, t: f64) -> PropValue {
    if t < 0.5 {
        a.clone()
    } else {
        b.clone()
    }
}

/// Blend two property values at normalized position `t`.
///
/// - numbers: linear blend
/// - arrays of equal length: element-wise blend
/// - objects with identical key sets: per-key blend
/// - everything else (booleans, strings, null, mismatched shapes): step
pub fn blend(a: &PropValue, b: &PropValue, t: f64) -> PropValue {
    match (a, b) {
        (Value::Number(na), Value::Number(nb)) => {
            let (Some(x), Some(y)) = (na.as_f64(), nb.as_f64()) else {
                return step(a, b, t);
            };
            match serde_json::Number::from_f64(x + (y - x) * t) {
                Some(n) => Value::Number(n),
                None => step(a, b, t),
            }
        }
        (Value::Array(xs), Value::Array(ys)) if xs.len() == ys.len() => {
            Value::Array(xs.iter().zip(ys).map(|(x, y)| blend(x, y, t)).collect())
        }
        (Value::Object(xs), Value::Object(ys)) if same_keys(xs, ys) => {
            let mut out = Map::with_capacity(xs.len());
            for (key, x) in xs {
                if let Some(y) = ys.get(key) {
                    out.insert(key.clone(), blend(x, y, t));
                }
            }
            Value::Object(out)
        }
        _ => step(a, b, t),
    }
}

fn same_keys(a: &Map<String, Value>, b: &Map<String, Value>) -> bool {
    a.len() == b.len() && a.keys().all(|k| b.contains_key(k))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blend_numbers() {
        assert_eq!(blend(&json!(0), &json!(10), 0.5), json!(5.0));
        assert_eq!(blend(&json!(-4.0), &json!(4.0), 0.25), json!(-2.0));
    }

    #[test]
    fn test_blend_bool_and_string_step() {
        assert_eq!(blend(&json!(false), &json!(true), 0.49), json!(false));
        assert_eq!(blend(&json!(false), &json!(true), 0.5), json!(true));
        assert_eq!(blend(&json!("a"), &json!("b"), 0.2), json!("a"));
    }

    #[test]
    fn test_blend_arrays() {
        assert_eq!(
            blend(&json!([0, 10]), &json!([10, 20]), 0.5),
            json!([5.0, 15.0])
        );
        // length mismatch steps
        assert_eq!(blend(&json!([0]), &json!([1, 2]), 0.7), json!([1, 2]));
    }

    #[test]
    fn test_blend_objects() {
        let a = json!({"x": 0, "y": 100});
        let b = json!({"x": 10, "y": 0});
        assert_eq!(blend(&a, &b, 0.5), json!({"x": 5.0, "y": 50.0}));

        let c = json!({"x": 10});
        assert_eq!(blend(&a, &c, 0.1), a);
    }

    #[test]
    fn test_blend_mismatched_shapes_step() {
        assert_eq!(blend(&json!(1), &json!("red"), 0.4), json!(1));
        assert_eq!(blend(&json!(null), &json!(3), 0.9), json!(3));
    }

    #[test]
    fn test_blend_nested() {
        let a = json!({"points": [[0, 0], [10, 10]]});
        let b = json!({"points": [[10, 0], [20, 30]]});
        assert_eq!(
            blend(&a, &b, 0.5),
            json!({"points": [[5.0, 0.0], [15.0, 20.0]]})
        );
    }
}
