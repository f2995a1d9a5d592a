//! Project workflow status.

use serde::{Deserialize, Serialize};

use crate::core::serialization::{FieldReader, FieldWriter, SerdeResult, Serializable};

/// Workflow label with its display color
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Status {
    pub status: String,
    pub color: String,
}

impl Status {
    pub fn new(status: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            color: color.into(),
        }
    }

    pub fn exported() -> Self {
        Self::new("Exported", "#11ff00")
    }

    pub fn to_export() -> Self {
        Self::new("To Export", "#e600ff")
    }

    pub fn to_caption() -> Self {
        Self::new("To Caption", "#ffea00")
    }

    pub fn not_set() -> Self {
        Self::new("Not Set", "#ffffff")
    }

    pub fn to_translate() -> Self {
        Self::new("To Translate", "#ffea00")
    }

    /// Every predefined status, in menu order
    pub fn predefined() -> Vec<Status> {
        vec![
            Self::exported(),
            Self::to_export(),
            Self::to_caption(),
            Self::not_set(),
            Self::to_translate(),
        ]
    }

    /// Looks up a predefined status by label (case-insensitive).
    pub fn from_label(label: &str) -> Option<Status> {
        Self::predefined()
            .into_iter()
            .find(|s| s.status.eq_ignore_ascii_case(label.trim()))
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::not_set()
    }
}

impl Serializable for Status {
    const TYPE_NAME: &'static str = "Status";

    fn write_fields(&self, out: &mut FieldWriter<'_>) -> SerdeResult<()> {
        out.value("status", &self.status)?
            .value("color", &self.color)?;
        Ok(())
    }

    fn from_fields(_variant: &str, fields: &FieldReader<'_>) -> SerdeResult<Self> {
        let fallback = Self::default();
        Ok(Self {
            status: fields.value_or("status", fallback.status)?,
            color: fields.value_or("color", fallback.color)?,
        })
    }
}
