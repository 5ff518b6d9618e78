//! Schemas derived from concrete Rust types, memoised by a caller-owned cache.

use crate::models::schema::SchemaNode;
use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use std::any::TypeId;
use std::sync::Arc;
use uuid::Uuid;

/// A type that can describe its own JSON shape
pub trait ContractType: 'static {
    fn describe() -> SchemaNode;
}

macro_rules! integer_contract {
    ($($t:ty),*) => {
        $(impl ContractType for $t {
            fn describe() -> SchemaNode {
                SchemaNode::integer().with_range(Some(<$t>::MIN as f64), Some(<$t>::MAX as f64))
            }
        })*
    };
}

integer_contract!(i8, i16, i32, u8, u16, u32);

impl ContractType for i64 {
    fn describe() -> SchemaNode {
        SchemaNode::integer()
    }
}

impl ContractType for u64 {
    fn describe() -> SchemaNode {
        SchemaNode::integer().with_range(Some(0.0), None)
    }
}

impl ContractType for f32 {
    fn describe() -> SchemaNode {
        SchemaNode::number()
    }
}

impl ContractType for f64 {
    fn describe() -> SchemaNode {
        SchemaNode::number()
    }
}

impl ContractType for bool {
    fn describe() -> SchemaNode {
        SchemaNode::boolean()
    }
}

impl ContractType for String {
    fn describe() -> SchemaNode {
        SchemaNode::string()
    }
}

impl ContractType for Uuid {
    fn describe() -> SchemaNode {
        SchemaNode::formatted("uuid")
    }
}

impl ContractType for DateTime<Utc> {
    fn describe() -> SchemaNode {
        SchemaNode::formatted("date-time")
    }
}

impl ContractType for NaiveDate {
    fn describe() -> SchemaNode {
        SchemaNode::formatted("date")
    }
}

impl<T: ContractType> ContractType for Option<T> {
    fn describe() -> SchemaNode {
        T::describe().nullable()
    }
}

impl<T: ContractType> ContractType for Vec<T> {
    fn describe() -> SchemaNode {
        SchemaNode::array(T::describe())
    }
}

/// Memoised `ContractType::describe` results keyed by type.
///
/// Construct one per contract-loading context and share it by reference;
/// concurrent lookups are safe.
#[derive(Debug, Default)]
pub struct SchemaCache {
    entries: DashMap<TypeId, Arc<SchemaNode>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the schema of `T`, describing it on first use
    pub fn get_or_describe<T: ContractType>(&self) -> Arc<SchemaNode> {
        let key = TypeId::of::<T>();
        if let Some(cached) = self.entries.get(&key) {
            return cached.value().clone();
        }

        // describe outside the shard lock; a racing insert wins and both callers share it
        let described = Arc::new(T::describe());
        tracing::trace!(type_name = std::any::type_name::<T>(), "described contract type");
        self.entries.entry(key).or_insert(described).value().clone()
    }

    pub fn contains<T: ContractType>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::schema::{SchemaKind, Shape};
    use crate::validation::{Direction, validate};
    use serde_json::json;

    struct Order;

    impl ContractType for Order {
        fn describe() -> SchemaNode {
            SchemaNode::object()
                .required_property("id", Uuid::describe())
                .required_property("placed_at", DateTime::<Utc>::describe())
                .required_property("quantity", u32::describe())
                .property("note", Option::<String>::describe())
                .required_property("tags", Vec::<String>::describe())
        }
    }

    #[test]
    fn test_primitive_descriptions() {
        assert_eq!(String::describe().kind(), SchemaKind::String);
        assert_eq!(bool::describe().kind(), SchemaKind::Boolean);
        assert_eq!(f64::describe().kind(), SchemaKind::Number);
        assert!(Option::<i64>::describe().nullable);

        let Shape::Integer(rules) = u8::describe().shape else {
            panic!("u8 should describe an integer");
        };
        assert_eq!(rules.minimum, Some(0.0));
        assert_eq!(rules.maximum, Some(255.0));
    }

    #[test]
    fn test_described_struct_validates_payloads() {
        let schema = Order::describe();
        let valid = json!({
            "id": "3fa85f64-5717-4562-b3fc-2c963f66afa6",
            "placed_at": "2024-05-01T10:00:00Z",
            "quantity": 3,
            "note": null,
            "tags": ["gift"]
        });
        assert!(validate(&valid, &schema, Direction::Request, None).is_empty());

        let invalid = json!({
            "id": "nope",
            "placed_at": "2024-05-01T10:00:00Z",
            "quantity": -1,
            "tags": []
        });
        assert_eq!(validate(&invalid, &schema, Direction::Request, None).len(), 2);
    }

    #[test]
    fn test_cache_memoises_per_type() {
        let cache = SchemaCache::new();
        assert!(cache.is_empty());

        let first = cache.get_or_describe::<Order>();
        let second = cache.get_or_describe::<Order>();
        assert!(Arc::ptr_eq(&first, &second));

        cache.get_or_describe::<Vec<Uuid>>();
        assert_eq!(cache.len(), 2);
        assert!(cache.contains::<Vec<Uuid>>());
        assert!(!cache.contains::<Uuid>());

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_shared_across_threads() {
        let cache = SchemaCache::new();
        let results: Vec<Arc<SchemaNode>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| cache.get_or_describe::<Order>()))
                .collect();
            handles
                .into_iter()
                .filter_map(|handle| handle.join().ok())
                .collect()
        });

        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
        assert_eq!(cache.len(), 1);
    }
}
