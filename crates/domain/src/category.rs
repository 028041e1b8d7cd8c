use derive_more::{Deref, Display};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::GroupLetter;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryID,
    pub name: String,
    pub group_letter: GroupLetter,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Category {
    #[must_use]
    pub fn new(id: CategoryID, name: impl Into<String>, group_letter: GroupLetter) -> Self {
        Self {
            id,
            name: name.into(),
            group_letter,
            extra: Map::new(),
        }
    }
}

#[derive(
    Deref, Display, Debug, Default, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CategoryID(String);

impl CategoryID {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl From<&str> for CategoryID {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for CategoryID {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_category_serde_keeps_unknown_fields() {
        let value = json!({"id": "c1", "name": "Peito", "groupLetter": "B", "isDefault": true});
        let category: Category = serde_json::from_value(value.clone()).unwrap();

        assert_eq!(category.id, "c1".into());
        assert_eq!(category.group_letter, GroupLetter::B);
        assert_eq!(category.extra.get("isDefault"), Some(&json!(true)));
        assert_eq!(serde_json::to_value(&category).unwrap(), value);
    }

    #[test]
    fn test_category_id_generate() {
        assert_ne!(CategoryID::generate(), CategoryID::generate());
        assert!(!CategoryID::generate().is_empty());
    }
}
