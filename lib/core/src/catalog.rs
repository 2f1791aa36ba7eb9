use serde::{Deserialize, Deserializer, Serialize};

/// Catalog item identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Integer(u64),
    String(String),
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemId::Integer(i) => write!(f, "{}", i),
            ItemId::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<u64> for ItemId {
    fn from(i: u64) -> Self {
        ItemId::Integer(i)
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        ItemId::String(s)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        ItemId::String(s.to_string())
    }
}

/// A perfume in the catalog
///
/// Read-only input to the scorer. `emotion_cluster` is assigned offline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ItemId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub brand: String,
    /// Note descriptors; on the wire either a list or one comma-separated string
    #[serde(default, deserialize_with = "deserialize_notes")]
    pub notes: Vec<String>,
    pub emotion_cluster: usize,
}

impl CatalogItem {
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<ItemId>, notes: &str, emotion_cluster: usize) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            brand: String::new(),
            notes: split_notes(notes),
            emotion_cluster,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>, brand: impl Into<String>) -> Self {
        self.name = name.into();
        self.brand = brand.into();
        self
    }

    /// Notes joined back into the comma-separated form
    pub fn note_string(&self) -> String {
        self.notes.join(", ")
    }
}

/// Split a comma-separated note string into raw entries
pub fn split_notes(raw: &str) -> Vec<String> {
    raw.split(',').map(|s| s.trim().to_string()).collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NotesRepr {
    Text(String),
    List(Vec<String>),
    Missing(()),
}

/// Accept notes as a comma-separated string, a list, or `null`
pub fn deserialize_notes<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match NotesRepr::deserialize(deserializer)? {
        NotesRepr::Text(s) => split_notes(&s),
        NotesRepr::List(list) => list,
        NotesRepr::Missing(()) => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notes_from_string() {
        let item: CatalogItem = serde_json::from_str(
            r#"{"id": 7, "name": "Bloom", "brand": "Gucci", "notes": "rose, vanilla ,jasmine", "emotion_cluster": 2}"#,
        )
        .unwrap();
        assert_eq!(item.id, ItemId::Integer(7));
        assert_eq!(item.notes, vec!["rose", "vanilla", "jasmine"]);
    }

    #[test]
    fn test_notes_from_list() {
        let item: CatalogItem = serde_json::from_str(
            r#"{"id": "p-1", "notes": ["oud", "smoke"], "emotion_cluster": 1}"#,
        )
        .unwrap();
        assert_eq!(item.id, ItemId::String("p-1".to_string()));
        assert_eq!(item.notes, vec!["oud", "smoke"]);
        assert!(item.name.is_empty());
    }

    #[test]
    fn test_null_notes_are_empty() {
        let item: CatalogItem =
            serde_json::from_str(r#"{"id": 1, "notes": null, "emotion_cluster": 0}"#).unwrap();
        assert!(item.notes.is_empty());
    }

    #[test]
    fn test_item_id_display() {
        assert_eq!(ItemId::from(42).to_string(), "42");
        assert_eq!(ItemId::from("abc").to_string(), "abc");
    }
}
