//! Extraction output

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A field whose transform rejected the page data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Flat result of one extraction: field name -> value
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AppRecord {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    /// Fields that fell back to their default, if any
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl AppRecord {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Typed view of the record
    pub fn details(&self) -> Result<AppDetails, serde_json::Error> {
        serde_json::from_value(Value::Object(self.fields.clone()))
    }
}

/// Typed app metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppDetails {
    pub app_id: String,
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "descriptionHTML")]
    pub description_html: Option<String>,
    pub summary: Option<String>,
    pub installs: Option<String>,
    pub min_installs: Option<u64>,
    pub max_installs: Option<u64>,
    pub score: Option<f64>,
    pub score_text: Option<String>,
    pub ratings: Option<u64>,
    pub reviews: Option<u64>,
    pub histogram: BTreeMap<u8, u64>,
    pub price: f64,
    pub free: bool,
    pub currency: Option<String>,
    pub price_text: String,
    #[serde(rename = "offersIAP")]
    pub offers_iap: bool,
    #[serde(rename = "IAPRange")]
    pub iap_range: Option<String>,
    pub developer: Option<String>,
    pub developer_id: Option<String>,
    pub developer_email: Option<String>,
    pub developer_website: Option<String>,
    pub developer_address: Option<String>,
    pub privacy_policy: Option<String>,
    pub genre: Option<String>,
    pub genre_id: Option<String>,
    pub icon: Option<String>,
    pub header_image: Option<String>,
    #[serde(default)]
    pub screenshots: Vec<Option<String>>,
    pub video: Option<String>,
    pub video_image: Option<String>,
    pub content_rating: Option<String>,
    pub content_rating_description: Option<String>,
    pub ad_supported: bool,
    pub released: Option<String>,
    pub updated: Option<f64>,
    pub version: Option<String>,
    pub recent_changes: Option<String>,
    #[serde(default)]
    pub comments: Vec<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serializes_flat() {
        let mut record = AppRecord::default();
        record.fields.insert("title".to_string(), json!("Demo"));
        assert_eq!(serde_json::to_value(&record).unwrap(), json!({"title": "Demo"}));

        record.errors.push(FieldError {
            field: "histogram".to_string(),
            message: "expected array, found string".to_string(),
        });
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["errors"][0]["field"], "histogram");
    }

    #[test]
    fn test_details_accepts_transform_outputs() {
        use crate::node::Node;
        use crate::transform;

        let mut record = AppRecord::default();
        let mut set = |name: &str, value: Value| {
            record.fields.insert(name.to_string(), value);
        };
        set("appId", json!("com.example.demo"));
        set("url", json!("https://play.example"));
        set("histogram", transform::histogram(None).unwrap());
        set("price", transform::price(None).unwrap());
        set("free", json!(true));
        set("priceText", json!("Free"));
        set("offersIAP", json!(false));
        set("adSupported", json!(false));
        set("updated", transform::timestamp_millis(Some(&Node::from(json!(1.5)))).unwrap());
        let reviews = Node::from(json!([[0, 0, 0, 0, "Great"], [0, 0, 0, 0, 5]]));
        set("comments", transform::comments(Some(&reviews)).unwrap());

        let details = record.details().unwrap();
        assert_eq!(details.updated, Some(1500.0));
        assert_eq!(details.comments, vec![json!("Great"), json!(5)]);
    }

    #[test]
    fn test_details_requires_context() {
        let record = AppRecord::default();
        assert!(record.details().is_err());
    }
}
