//! Snapshot capture
//!
//! Snapshots are taken by serializing caller state into an owned
//! `serde_json::Value`. The value tree shares nothing with the caller, so later
//! mutation of the caller's objects never reaches a recorded entry.
//!
//! Cyclic object graphs (e.g. `Rc` cycles behind a custom `Serialize`) are not
//! supported.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Take an independent snapshot of `state`
///
/// Fails for values JSON cannot represent, such as maps keyed by structs.
pub fn capture<T: Serialize + ?Sized>(state: &T) -> Result<Value, serde_json::Error> {
    serde_json::to_value(state)
}

/// Rebuild typed state from a snapshot
pub fn restore<T: DeserializeOwned>(snapshot: &Value) -> Result<T, serde_json::Error> {
    T::deserialize(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use std::collections::{BTreeMap, HashMap};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Product {
        sku: String,
        price_cents: u32,
        tags: Vec<String>,
    }

    #[test]
    fn test_capture_is_independent_of_source() {
        let mut product = Product {
            sku: "SALMON-1KG".to_string(),
            price_cents: 1899,
            tags: vec!["fresh".to_string()],
        };
        let snapshot = capture(&product).unwrap();

        product.price_cents = 999;
        product.tags.push("discount".to_string());

        assert_eq!(snapshot["price_cents"], 1899);
        assert_eq!(snapshot["tags"], json!(["fresh"]));
    }

    #[test]
    fn test_restore_typed_state() {
        let product = Product {
            sku: "COD-500G".to_string(),
            price_cents: 750,
            tags: vec![],
        };
        let snapshot = capture(&product).unwrap();
        let back: Product = restore(&snapshot).unwrap();
        assert_eq!(back, product);
    }

    #[test]
    fn test_capture_unit_is_null() {
        assert_eq!(capture(&()).unwrap(), Value::Null);
        assert_eq!(capture(&Option::<u8>::None).unwrap(), Value::Null);
    }

    #[test]
    fn test_capture_rejects_non_string_map_keys() {
        let mut map: HashMap<(u8, u8), &str> = HashMap::new();
        map.insert((1, 2), "crate");
        assert!(capture(&map).is_err());
    }

    #[test]
    fn test_capture_nested_containers() {
        let mut inner = BTreeMap::new();
        inner.insert("lots", vec![json!({"kg": 4.5}), json!(null)]);
        let snapshot = capture(&inner).unwrap();
        assert_eq!(snapshot["lots"][0]["kg"], 4.5);
    }

    #[test]
    fn test_restore_wrong_shape_fails() {
        let snapshot = json!({"sku": 12});
        assert!(restore::<Product>(&snapshot).is_err());
    }
}
