//! Record identities
//!
//! Cascades cross tables with different key types, so the soft-delete engine
//! works with [`UniversalId`] rather than each model's own `Id` type.

use serde_json::Value;
use std::fmt::{self, Display};
use uuid::Uuid;

/// Universal ID type that can handle both numeric IDs and UUIDs
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UniversalId {
    Numeric(i64),
    Uuid(Uuid),
    String(String),
}

impl UniversalId {
    /// Read an id out of a JSON row value; `null` and composite values have none
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(UniversalId::Numeric),
            Value::String(s) => Some(match Uuid::parse_str(s) {
                Ok(uuid) => UniversalId::Uuid(uuid),
                Err(_) => UniversalId::String(s.clone()),
            }),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            UniversalId::Numeric(n) => Value::from(*n),
            UniversalId::Uuid(uuid) => Value::String(uuid.to_string()),
            UniversalId::String(s) => Value::String(s.clone()),
        }
    }
}

impl Display for UniversalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniversalId::Numeric(n) => write!(f, "{}", n),
            UniversalId::Uuid(uuid) => write!(f, "{}", uuid),
            UniversalId::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<i32> for UniversalId {
    fn from(id: i32) -> Self {
        UniversalId::Numeric(i64::from(id))
    }
}

impl From<i64> for UniversalId {
    fn from(id: i64) -> Self {
        UniversalId::Numeric(id)
    }
}

impl From<Uuid> for UniversalId {
    fn from(id: Uuid) -> Self {
        UniversalId::Uuid(id)
    }
}

impl From<String> for UniversalId {
    fn from(id: String) -> Self {
        UniversalId::String(id)
    }
}

impl From<&str> for UniversalId {
    fn from(id: &str) -> Self {
        UniversalId::String(id.to_string())
    }
}

/// Trait for types that can provide a universal ID
pub trait HasUniversalId {
    fn universal_id(&self) -> UniversalId;
}

impl HasUniversalId for i32 {
    fn universal_id(&self) -> UniversalId {
        UniversalId::Numeric(i64::from(*self))
    }
}

impl HasUniversalId for i64 {
    fn universal_id(&self) -> UniversalId {
        UniversalId::Numeric(*self)
    }
}

impl HasUniversalId for Uuid {
    fn universal_id(&self) -> UniversalId {
        UniversalId::Uuid(*self)
    }
}

impl HasUniversalId for String {
    fn universal_id(&self) -> UniversalId {
        UniversalId::String(self.clone())
    }
}

impl HasUniversalId for UniversalId {
    fn universal_id(&self) -> UniversalId {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_recognises_uuid_strings() {
        let uuid = Uuid::new_v4();
        assert_eq!(
            UniversalId::from_json(&json!(uuid.to_string())),
            Some(UniversalId::Uuid(uuid))
        );
        assert_eq!(
            UniversalId::from_json(&json!("sku-1")),
            Some(UniversalId::String("sku-1".to_string()))
        );
        assert_eq!(UniversalId::from_json(&json!(12)), Some(UniversalId::Numeric(12)));
        assert_eq!(UniversalId::from_json(&Value::Null), None);
    }

    #[test]
    fn test_json_and_display_agree() {
        let id = UniversalId::from(Uuid::nil());
        assert_eq!(id.to_json(), json!(id.to_string()));
        assert_eq!(UniversalId::from(5).to_json(), json!(5));
    }
}
