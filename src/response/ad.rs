use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fields that may carry an ad's identifier, in lookup order
pub const ID_FIELDS: [&str; 3] = ["ad_id", "list_id", "id"];

/// A single ad, exactly as the provider sent it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ad(Value);

impl Ad {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Checks whether any identifier field equals `id` exactly
    ///
    /// String identifiers must match verbatim; numeric identifiers match
    /// when `id` is their decimal rendering. Substring matches never count.
    pub fn has_id(&self, id: &str) -> bool {
        let Some(fields) = self.0.as_object() else {
            return false;
        };

        ID_FIELDS
            .iter()
            .filter_map(|field| fields.get(*field))
            .any(|value| id_matches(value, id))
    }

    /// Decodes this ad into the typed representation
    pub fn to_typed(&self) -> serde_json::Result<BlocketAd> {
        serde_json::from_value(self.0.clone())
    }
}

impl From<Value> for Ad {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

fn id_matches(value: &Value, id: &str) -> bool {
    match value {
        Value::String(s) => s == id,
        // Canonical decimal rendering only, so "0123" or "+123" never match 123
        Value::Number(n) => n.to_string() == id,
        _ => false,
    }
}

/// Typed view of a Blocket ad
///
/// Every field is optional so that ads from older or newer API revisions
/// still decode; fields not listed here are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlocketAd {
    pub ad_id: Option<String>,
    pub list_id: Option<String>,
    pub ad_status: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub price: Option<Price>,
    pub advertiser: Option<Advertiser>,
    /// ISO 8601 listing timestamp
    pub list_time: Option<String>,
    pub share_url: Option<String>,
    pub map_url: Option<String>,
    pub zipcode: Option<String>,
    #[serde(rename = "type")]
    pub ad_type: Option<String>,
    #[serde(default)]
    pub images: Vec<Value>,
    #[serde(default)]
    pub location: Vec<Value>,
    #[serde(default)]
    pub category: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub value: Option<i64>,
    pub suffix: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Advertiser {
    pub account_id: Option<String>,
    pub name: Option<String>,
    /// `private` or `business`
    #[serde(rename = "type")]
    pub advertiser_type: Option<String>,
}
