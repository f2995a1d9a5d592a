//! Video Styles
//!
//! Free-form design tokens for one render target (`"arabic"` or a
//! translation edition), grouped in categories. Unknown keys are carried
//! through untouched so that documents written by newer versions survive a
//! load/save cycle.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::now_timestamp;
use crate::core::serialization::{FieldReader, FieldWriter, SerdeResult, Serializable};

/// Value of a style token
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StyleValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl From<bool> for StyleValue {
    fn from(value: bool) -> Self {
        StyleValue::Bool(value)
    }
}

impl From<&str> for StyleValue {
    fn from(value: &str) -> Self {
        StyleValue::Text(value.to_string())
    }
}

impl From<i64> for StyleValue {
    fn from(value: i64) -> Self {
        StyleValue::Number(value.into())
    }
}

/// Editor widget used for a token
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleValueType {
    Color,
    Number,
    Select,
    Boolean,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub value: StyleValue,
    pub value_type: StyleValueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_min: Option<serde_json::Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_max: Option<serde_json::Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<serde_json::Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub css: String,
    #[serde(default)]
    pub apply_globally: bool,
    #[serde(default)]
    pub icon: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub styles: BTreeMap<String, Style>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Style document of one render target
#[derive(Clone, Debug, PartialEq)]
pub struct VideoStyle {
    pub styles: BTreeMap<String, Category>,
    pub last_updated: DateTime<Utc>,
}

impl Default for VideoStyle {
    fn default() -> Self {
        Self {
            styles: BTreeMap::new(),
            last_updated: now_timestamp(),
        }
    }
}

impl VideoStyle {
    pub fn new(styles: BTreeMap<String, Category>) -> Self {
        Self {
            styles,
            last_updated: now_timestamp(),
        }
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.styles.get(name)
    }

    pub fn style(&self, category: &str, name: &str) -> Option<&Style> {
        self.category(category)?.styles.get(name)
    }

    /// Sets a token's value. Returns `false` when the token does not exist.
    pub fn update_style_value(
        &mut self,
        category: &str,
        name: &str,
        value: impl Into<StyleValue>,
    ) -> bool {
        let Some(style) = self
            .styles
            .get_mut(category)
            .and_then(|c| c.styles.get_mut(name))
        else {
            return false;
        };
        style.value = value.into();
        self.last_updated = now_timestamp();
        true
    }
}

impl Serializable for VideoStyle {
    const TYPE_NAME: &'static str = "VideoStyle";

    fn write_fields(&self, out: &mut FieldWriter<'_>) -> SerdeResult<()> {
        out.value("styles", &self.styles)?
            .date("lastUpdated", &self.last_updated)?;
        Ok(())
    }

    fn from_fields(_variant: &str, fields: &FieldReader<'_>) -> SerdeResult<Self> {
        Ok(Self {
            styles: fields.value_or_default("styles")?,
            last_updated: fields.date_or("lastUpdated", now_timestamp())?,
        })
    }
}
