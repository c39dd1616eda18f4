//! Validated tool arguments and scalar-or-array normalization.
//!
//! Several tools accept either one item or a list of items for the same
//! field (`delete.key`, `lpush.value`, `zrem.member`, ...). [`OneOrMany`]
//! captures what the caller sent; [`Items`] is the canonical ordered
//! sequence that everything downstream uses. The original [`Shape`] is kept
//! only so responses can say "deleted key: a" vs. "deleted 3 keys".

use kvbridge_core::{Error, Result};
use serde::Deserialize;

// ============================================================================
// Normalizer
// ============================================================================

/// Which form a dual-shape field arrived in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    /// A single bare value.
    Scalar,
    /// An array of values.
    Sequence,
}

/// A field that may be sent as one value or as an array of values.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// A single bare value.
    One(T),
    /// An array of values.
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// Resolve into an ordered sequence plus the original shape.
    ///
    /// Order is preserved; nothing is sorted or deduplicated.
    pub fn normalize(self) -> (Vec<T>, Shape) {
        match self {
            OneOrMany::One(value) => (vec![value], Shape::Scalar),
            OneOrMany::Many(values) => (values, Shape::Sequence),
        }
    }
}

/// Canonical form of a scalar-or-array string field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Items {
    values: Vec<String>,
    shape: Shape,
}

impl Items {
    /// Normalize caller input.
    pub fn from_input(input: OneOrMany<String>) -> Self {
        let (values, shape) = input.normalize();
        Self { values, shape }
    }

    /// The items, in caller order.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Number of items supplied.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no items were supplied (an empty array).
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Shape the caller used.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// The single value, when the caller sent a bare scalar.
    pub fn as_scalar(&self) -> Option<&str> {
        match (self.shape, self.values.as_slice()) {
            (Shape::Scalar, [only]) => Some(only),
            _ => None,
        }
    }
}

// ============================================================================
// ValidatedArguments
// ============================================================================

/// A typed argument value.
#[derive(Clone, Debug, PartialEq)]
pub enum ArgValue {
    /// String field
    Str(String),
    /// Number field
    Number(f64),
    /// Boolean field
    Bool(bool),
    /// Scalar-or-array string field, normalized
    Items(Items),
}

/// Arguments that passed validation against a tool's schema.
///
/// Built all at once by [`ToolDefinition::validate`](crate::schema::ToolDefinition::validate);
/// there is no partially validated state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValidatedArguments {
    values: Vec<(&'static str, ArgValue)>,
}

impl ValidatedArguments {
    pub(crate) fn insert(&mut self, name: &'static str, value: ArgValue) {
        self.values.push((name, value));
    }

    fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
    }

    /// A required string field.
    pub fn str(&self, name: &str) -> Result<&str> {
        self.opt_str(name).ok_or_else(|| missing(name))
    }

    /// An optional string field.
    pub fn opt_str(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(ArgValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// A required number field.
    pub fn number(&self, name: &str) -> Result<f64> {
        self.opt_number(name).ok_or_else(|| missing(name))
    }

    /// An optional number field.
    pub fn opt_number(&self, name: &str) -> Option<f64> {
        match self.get(name) {
            Some(ArgValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    /// A boolean field (always present once defaults are applied).
    pub fn bool(&self, name: &str) -> Result<bool> {
        match self.get(name) {
            Some(ArgValue::Bool(b)) => Ok(*b),
            _ => Err(missing(name)),
        }
    }

    /// A scalar-or-array field, normalized.
    pub fn items(&self, name: &str) -> Result<&Items> {
        match self.get(name) {
            Some(ArgValue::Items(items)) => Ok(items),
            _ => Err(missing(name)),
        }
    }

    /// Number of bound fields.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no fields are bound.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn missing(name: &str) -> Error {
    Error::invalid_argument(name, "missing required field")
}

/// Render a number the way the store expects it on the wire.
///
/// Whole numbers are sent without a fractional part so that integer-only
/// commands (`EXPIRE`, `LRANGE`) accept them.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_scalar_normalizes_to_single_item() {
        let input: OneOrMany<String> = serde_json::from_value(json!("a")).unwrap();
        let items = Items::from_input(input);
        assert_eq!(items.values(), ["a"]);
        assert_eq!(items.shape(), Shape::Scalar);
        assert_eq!(items.as_scalar(), Some("a"));
    }

    #[test]
    fn test_array_keeps_order() {
        let input: OneOrMany<String> = serde_json::from_value(json!(["c", "a", "b", "a"])).unwrap();
        let items = Items::from_input(input);
        assert_eq!(items.values(), ["c", "a", "b", "a"]);
        assert_eq!(items.shape(), Shape::Sequence);
        assert_eq!(items.as_scalar(), None);
    }

    #[test]
    fn test_single_element_array_is_still_a_sequence() {
        let input: OneOrMany<String> = serde_json::from_value(json!(["only"])).unwrap();
        let items = Items::from_input(input);
        assert_eq!(items.len(), 1);
        assert_eq!(items.shape(), Shape::Sequence);
        assert_eq!(items.as_scalar(), None);
    }

    #[test]
    fn test_mixed_array_is_rejected() {
        let result = serde_json::from_value::<OneOrMany<String>>(json!(["a", 1]));
        assert!(result.is_err());
    }

    #[test]
    fn test_accessors() {
        let mut args = ValidatedArguments::default();
        args.insert("key", ArgValue::Str("k".into()));
        args.insert("score", ArgValue::Number(0.0));
        args.insert("withScores", ArgValue::Bool(false));

        assert_eq!(args.str("key").unwrap(), "k");
        assert_eq!(args.number("score").unwrap(), 0.0);
        assert!(!args.bool("withScores").unwrap());
        assert_eq!(args.opt_str("pattern"), None);
        assert_eq!(args.len(), 3);

        let err = args.str("missing").unwrap_err();
        assert!(matches!(err, Error::InvalidArguments { ref field, .. } if field == "missing"));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(5.0), "5");
        assert_eq!(format_number(-1.0), "-1");
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(1.5), "1.5");
    }

    proptest! {
        #[test]
        fn test_normalize_preserves_order_and_length(values in proptest::collection::vec("\\PC*", 0..16)) {
            let items = Items::from_input(OneOrMany::Many(values.clone()));
            prop_assert_eq!(items.values(), values.as_slice());
            prop_assert_eq!(items.len(), values.len());
        }

        #[test]
        fn test_normalize_scalar_is_singleton(value in "\\PC*") {
            let items = Items::from_input(OneOrMany::One(value.clone()));
            prop_assert_eq!(items.values(), [value]);
        }
    }
}
