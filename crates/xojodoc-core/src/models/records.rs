//! Class, property and method records.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// One documented class, as extracted from its page.
///
/// `(module, name)` identifies the class; both are always non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassRecord {
    pub name: String,
    pub module: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sample_code: Option<String>,
    #[serde(default)]
    pub compatibility: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Source page this record was extracted from.
    pub file_path: String,
}

/// A property row owned by exactly one class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub name: String,
    #[serde(default)]
    pub type_name: Option<String>,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub shared: bool,
    #[serde(default)]
    pub description: Option<String>,
}

impl PropertyRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: None,
            read_only: false,
            shared: false,
            description: None,
        }
    }
}

/// A method row owned by exactly one class.
///
/// `parameters` holds the raw parameter-list text without enclosing parentheses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodRecord {
    pub name: String,
    #[serde(default)]
    pub parameters: Option<String>,
    #[serde(default)]
    pub return_type: Option<String>,
    #[serde(default)]
    pub shared: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sample_code: Option<String>,
}

impl MethodRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: None,
            return_type: None,
            shared: false,
            description: None,
            sample_code: None,
        }
    }

    /// Signature as shown to users, e.g. `DrawLine(x1 As Double, ...) As Boolean`.
    pub fn signature(&self) -> String {
        let mut signature = format!(
            "{}({})",
            self.name,
            self.parameters.as_deref().unwrap_or_default()
        );
        if let Some(return_type) = &self.return_type {
            signature.push_str(" As ");
            signature.push_str(return_type);
        }
        signature
    }
}

/// A class row as persisted, with its store-assigned id and bookkeeping times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredClass {
    pub id: i64,
    #[serde(flatten)]
    pub record: ClassRecord,
    /// File modification time observed when the page was last extracted (Unix seconds).
    pub file_mtime: Option<f64>,
    /// When the class was last written (Unix seconds).
    pub indexed_at: Option<f64>,
}

impl StoredClass {
    pub fn indexed_at_utc(&self) -> Option<DateTime<Utc>> {
        self.indexed_at.and_then(unix_seconds_to_utc)
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.record.module, self.record.name)
    }
}

/// A class together with its ordered children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDetails {
    #[serde(flatten)]
    pub class: StoredClass,
    pub properties: Vec<PropertyRecord>,
    pub methods: Vec<MethodRecord>,
}

/// A method together with the class that owns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDetails {
    pub class_id: i64,
    pub class_name: String,
    pub module: String,
    pub method: MethodRecord,
    /// Number of methods on the class sharing this name (1 when not overloaded).
    pub overloads: usize,
}

/// Corpus-wide counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryStats {
    pub total_classes: usize,
    pub deprecated_classes: usize,
    pub total_properties: usize,
    pub total_methods: usize,
    /// Class count per module, ordered by module name.
    pub modules: Vec<(String, usize)>,
}

/// Current wall-clock time as Unix seconds with sub-second precision.
pub fn now_unix_seconds() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

fn unix_seconds_to_utc(seconds: f64) -> Option<DateTime<Utc>> {
    let micros = (seconds * 1_000_000.0).round() as i64;
    Utc.timestamp_micros(micros).single()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_signature() {
        let mut method = MethodRecord::new("DrawLine");
        assert_eq!(method.signature(), "DrawLine()");

        method.parameters = Some("x1 As Double, y1 As Double".to_string());
        method.return_type = Some("Boolean".to_string());
        assert_eq!(
            method.signature(),
            "DrawLine(x1 As Double, y1 As Double) As Boolean"
        );
    }

    #[test]
    fn test_indexed_at_utc() {
        let class = StoredClass {
            id: 1,
            record: ClassRecord {
                name: "Graphics".to_string(),
                module: "graphics".to_string(),
                description: String::new(),
                sample_code: None,
                compatibility: None,
                notes: None,
                file_path: "graphics/graphics.html".to_string(),
            },
            file_mtime: None,
            indexed_at: Some(1_700_000_000.5),
        };

        let when = class.indexed_at_utc().unwrap();
        assert_eq!(when.timestamp(), 1_700_000_000);
        assert_eq!(class.qualified_name(), "graphics.Graphics");
    }

    #[test]
    fn test_now_unix_seconds_is_recent() {
        assert!(now_unix_seconds() > 1_600_000_000.0);
    }
}
