//! Untagged unions of two or three wire shapes.
//!
//! Many protocol fields are declared as raw unions (`number | string`,
//! `SemanticTokens | SemanticTokensDelta`, ...) with no discriminator on the
//! wire. [`TwoOf`] and [`ThreeOf`] decode by trying each alternative in
//! declaration order and keeping the first structural success.
//!
//! The order is part of the type's contract: when two alternatives both
//! match a value (for example two object shapes whose fields are all
//! optional), the earlier one wins. Declare the most specific shape first.
//!
//! Encoding writes the held alternative as-is, with no wrapper.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// A value that is structurally one of two shapes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TwoOf<A, B> {
    /// The first declared alternative.
    First(A),
    /// The second declared alternative.
    Second(B),
}

/// A value that is structurally one of three shapes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ThreeOf<A, B, C> {
    /// The first declared alternative.
    First(A),
    /// The second declared alternative.
    Second(B),
    /// The third declared alternative.
    Third(C),
}

/// Decoding failed for every alternative of a union.
#[derive(Debug)]
pub struct UnionError {
    /// Type names of the alternatives, in the order they were attempted.
    pub attempted: Vec<&'static str>,
    /// The error reported by the last alternative.
    pub last: serde_json::Error,
}

impl std::fmt::Display for UnionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "value matches none of [{}]; last error: {}",
            self.attempted.join(", "),
            self.last
        )
    }
}

impl std::error::Error for UnionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.last)
    }
}

/// Tries one alternative against a borrowed value.
fn attempt<T: DeserializeOwned>(value: &Value) -> Result<T, serde_json::Error> {
    T::deserialize(value)
}

impl<A: DeserializeOwned, B: DeserializeOwned> TwoOf<A, B> {
    /// Decodes a JSON value, trying `A` then `B`.
    pub fn from_value(value: &Value) -> Result<Self, UnionError> {
        if let Ok(a) = attempt::<A>(value) {
            return Ok(TwoOf::First(a));
        }
        attempt::<B>(value)
            .map(TwoOf::Second)
            .map_err(|last| UnionError {
                attempted: vec![std::any::type_name::<A>(), std::any::type_name::<B>()],
                last,
            })
    }
}

impl<A: DeserializeOwned, B: DeserializeOwned, C: DeserializeOwned> ThreeOf<A, B, C> {
    /// Decodes a JSON value, trying `A`, then `B`, then `C`.
    pub fn from_value(value: &Value) -> Result<Self, UnionError> {
        if let Ok(a) = attempt::<A>(value) {
            return Ok(ThreeOf::First(a));
        }
        if let Ok(b) = attempt::<B>(value) {
            return Ok(ThreeOf::Second(b));
        }
        attempt::<C>(value)
            .map(ThreeOf::Third)
            .map_err(|last| UnionError {
                attempted: vec![
                    std::any::type_name::<A>(),
                    std::any::type_name::<B>(),
                    std::any::type_name::<C>(),
                ],
                last,
            })
    }
}

impl<A: Serialize, B: Serialize> Serialize for TwoOf<A, B> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TwoOf::First(a) => a.serialize(serializer),
            TwoOf::Second(b) => b.serialize(serializer),
        }
    }
}

impl<A: Serialize, B: Serialize, C: Serialize> Serialize for ThreeOf<A, B, C> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ThreeOf::First(a) => a.serialize(serializer),
            ThreeOf::Second(b) => b.serialize(serializer),
            ThreeOf::Third(c) => c.serialize(serializer),
        }
    }
}

impl<'de, A: DeserializeOwned, B: DeserializeOwned> Deserialize<'de> for TwoOf<A, B> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        TwoOf::from_value(&value).map_err(D::Error::custom)
    }
}

impl<'de, A, B, C> Deserialize<'de> for ThreeOf<A, B, C>
where
    A: DeserializeOwned,
    B: DeserializeOwned,
    C: DeserializeOwned,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        ThreeOf::from_value(&value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq, Deserialize, Serialize)]
    struct Loose {
        label: Option<String>,
    }

    #[derive(Debug, PartialEq, Deserialize, Serialize)]
    struct AlsoLoose {
        label: Option<String>,
        kind: Option<u32>,
    }

    #[test]
    fn integer_decodes_as_first_alternative() {
        let v: TwoOf<i64, String> = serde_json::from_value(json!(5)).unwrap();
        assert_eq!(v, TwoOf::First(5));
    }

    #[test]
    fn string_decodes_as_second_alternative() {
        let v: TwoOf<i64, String> = serde_json::from_value(json!("5")).unwrap();
        assert_eq!(v, TwoOf::Second("5".to_string()));
    }

    #[test]
    fn mismatch_cites_both_shapes() {
        let err = TwoOf::<i64, String>::from_value(&json!(true)).unwrap_err();
        assert_eq!(err.attempted, vec!["i64", "alloc::string::String"]);
        let message = err.to_string();
        assert!(message.contains("i64"));
        assert!(message.contains("String"));

        let via_serde = serde_json::from_value::<TwoOf<i64, String>>(json!(true));
        assert!(via_serde.is_err());
    }

    #[test]
    fn overlapping_shapes_resolve_to_declaration_order() {
        let v: TwoOf<Loose, AlsoLoose> =
            serde_json::from_value(json!({"label": "x", "kind": 3})).unwrap();
        assert!(matches!(v, TwoOf::First(Loose { label: Some(_) })));
    }

    #[test]
    fn three_way_falls_through_to_last() {
        let v: ThreeOf<bool, i64, Vec<u32>> = serde_json::from_value(json!([1, 2])).unwrap();
        assert_eq!(v, ThreeOf::Third(vec![1, 2]));

        let err = ThreeOf::<bool, i64, Vec<u32>>::from_value(&json!("no")).unwrap_err();
        assert_eq!(err.attempted.len(), 3);
    }

    #[test]
    fn encodes_without_wrapper() {
        let v: TwoOf<i64, String> = TwoOf::Second("five".into());
        assert_eq!(serde_json::to_value(&v).unwrap(), json!("five"));
        let v: ThreeOf<bool, i64, String> = ThreeOf::Second(7);
        assert_eq!(serde_json::to_string(&v).unwrap(), "7");
    }
}
