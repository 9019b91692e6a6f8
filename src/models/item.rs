use crate::search::{SearchError, SearchResult};
use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use validator::Validate;

/// Designated text fields every [`Item`] exposes by name.
pub const BUILTIN_FIELDS: &[&str] = &[
    "name",
    "description",
    "category",
    "manufacturer",
    "model",
    "sku",
    "tags",
];

/// A catalog record supplied by the caller.
///
/// The engine never mutates an item; it only reads designated text fields and
/// the structured attributes used by filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Item {
    /// Unique identifier
    #[validate(length(min = 1, max = 255))]
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Free-form description
    #[serde(default)]
    pub description: String,

    /// Category label
    #[serde(default)]
    pub category: Option<String>,

    /// Manufacturer name
    #[serde(default)]
    pub manufacturer: Option<String>,

    /// Model designation
    #[serde(default)]
    pub model: Option<String>,

    /// Stock keeping unit
    #[serde(default)]
    pub sku: Option<String>,

    /// Unit price
    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub price: Option<f64>,

    /// Tags
    #[serde(default)]
    pub tags: Vec<String>,

    /// Whether the item is currently in stock
    #[serde(default)]
    pub in_stock: bool,

    /// Additional named text attributes, searchable by key
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl Item {
    /// Create a new item with only an identifier and a name
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            category: None,
            manufacturer: None,
            model: None,
            sku: None,
            price: None,
            tags: Vec::new(),
            in_stock: false,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_tags(mut self, tags: Vec<impl Into<String>>) -> Self {
        self.tags = tags.into_iter().map(|t| t.into()).collect();
        self
    }

    pub fn with_stock(mut self, in_stock: bool) -> Self {
        self.in_stock = in_stock;
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Text of a designated field, or `None` when the field is missing or blank.
    ///
    /// Tags are joined with spaces. Names outside [`BUILTIN_FIELDS`] are looked
    /// up in [`Item::attributes`].
    pub fn field_text(&self, field: &str) -> Option<Cow<'_, str>> {
        let text: Cow<'_, str> = match field {
            "name" => Cow::Borrowed(self.name.as_str()),
            "description" => Cow::Borrowed(self.description.as_str()),
            "category" => Cow::Borrowed(self.category.as_deref()?),
            "manufacturer" => Cow::Borrowed(self.manufacturer.as_deref()?),
            "model" => Cow::Borrowed(self.model.as_deref()?),
            "sku" => Cow::Borrowed(self.sku.as_deref()?),
            "tags" => Cow::Owned(self.tags.join(" ")),
            other => Cow::Borrowed(self.attributes.get(other)?.as_str()),
        };

        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Whether every tag in `required` is present on this item
    pub fn has_all_tags<S: AsRef<str>>(&self, required: &[S]) -> bool {
        required.iter().all(|tag| {
            let tag = tag.as_ref().trim().to_lowercase();
            self.tags.iter().any(|t| t.trim().to_lowercase() == tag)
        })
    }

    /// Reject items the index and the linear scan cannot use
    pub fn check(&self) -> SearchResult<()> {
        self.validate()
            .map_err(|e| SearchError::MalformedItem(format!("item '{}': {}", self.id, e)))
    }
}

/// Identifiers arrive from upstream stores either as strings or as numbers.
fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Int(n) => n.to_string(),
        RawId::Float(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_text_builtin_and_attributes() {
        let item = Item::new("1", "Camera")
            .with_category("Optics")
            .with_tags(vec!["digital", "mirrorless"])
            .with_attribute("color", "black");

        assert_eq!(item.field_text("name").as_deref(), Some("Camera"));
        assert_eq!(item.field_text("category").as_deref(), Some("Optics"));
        assert_eq!(item.field_text("tags").as_deref(), Some("digital mirrorless"));
        assert_eq!(item.field_text("color").as_deref(), Some("black"));
        assert!(item.field_text("description").is_none());
        assert!(item.field_text("manufacturer").is_none());
        assert!(item.field_text("unknown").is_none());
    }

    #[test]
    fn test_validation_rejects_empty_id() {
        let item = Item::new("", "Nameless");
        assert!(item.validate().is_err());

        let item = Item::new("7", "Tripod").with_price(-1.0);
        assert!(item.validate().is_err());

        let item = Item::new("7", "Tripod").with_price(20.0);
        assert!(item.validate().is_ok());
    }

    #[test]
    fn test_check_reports_malformed_item() {
        let err = Item::new("9", "Flash").with_price(-5.0).check().unwrap_err();
        assert!(matches!(err, SearchError::MalformedItem(ref msg) if msg.contains("'9'")));
        assert!(Item::new("9", "Flash").check().is_ok());
    }

    #[test]
    fn test_has_all_tags() {
        let item = Item::new("1", "Lens").with_tags(vec!["Prime", "50mm"]);
        assert!(item.has_all_tags(&["prime"]));
        assert!(item.has_all_tags(&["prime", "50mm"]));
        assert!(!item.has_all_tags(&["prime", "zoom"]));
        assert!(item.has_all_tags::<&str>(&[]));
    }

    #[test]
    fn test_has_all_tags_folds_unicode_case() {
        let item = Item::new("1", "Bag").with_tags(vec!["Éco", "Straße"]);
        assert!(item.has_all_tags(&["éco"]));
        assert!(item.has_all_tags(&["ÉCO", " straße "]));
        assert!(!item.has_all_tags(&["eco"]));
    }

    #[test]
    fn test_deserialize_numeric_id_and_defaults() {
        let item: Item = serde_json::from_str(r#"{"id": 42, "name": "Flash"}"#).unwrap();
        assert_eq!(item.id, "42");
        assert_eq!(item.name, "Flash");
        assert!(item.tags.is_empty());
        assert!(!item.in_stock);
    }
}
