/*
 * display_data.rs
 *
 * Copyright (C) 2023 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use serde_json::Map;
use serde_json::Value;

use crate::wire::jupyter_message::MessageType;

/// The closed set of MIME types a kernel can publish. Image types carry their
/// dimensions, which travel in the `metadata` map on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MimeType {
    PlainText,
    Html,
    Png { width: u32, height: u32 },
    Jpeg { width: u32, height: u32 },
    Svg,
    Latex,
    Javascript,
}

impl MimeType {
    /// The MIME type string used as the key in the `data` and `metadata` maps.
    pub fn mime(&self) -> &'static str {
        match self {
            MimeType::PlainText => "text/plain",
            MimeType::Html => "text/html",
            MimeType::Png { .. } => "image/png",
            MimeType::Jpeg { .. } => "image/jpeg",
            MimeType::Svg => "image/svg+xml",
            MimeType::Latex => "text/latex",
            MimeType::Javascript => "application/javascript",
        }
    }

    /// The per-mime metadata object, if the type carries any.
    fn wire_metadata(&self) -> Option<Value> {
        match self {
            MimeType::Png { width, height } | MimeType::Jpeg { width, height } => {
                Some(json!({ "width": width, "height": height }))
            }
            _ => None,
        }
    }

    fn from_wire(mime: &str, metadata: Option<&Value>) -> Result<Self, String> {
        match mime {
            "text/plain" => Ok(MimeType::PlainText),
            "text/html" => Ok(MimeType::Html),
            "image/svg+xml" => Ok(MimeType::Svg),
            "text/latex" => Ok(MimeType::Latex),
            "application/javascript" => Ok(MimeType::Javascript),
            "image/png" => {
                let (width, height) = Self::dimensions(mime, metadata)?;
                Ok(MimeType::Png { width, height })
            }
            "image/jpeg" => {
                let (width, height) = Self::dimensions(mime, metadata)?;
                Ok(MimeType::Jpeg { width, height })
            }
            other => Err(format!("unknown mime type '{}'", other)),
        }
    }

    fn dimensions(mime: &str, metadata: Option<&Value>) -> Result<(u32, u32), String> {
        let read = |key: &str| -> Option<u32> {
            metadata?.get(key)?.as_u64().map(|value| value as u32)
        };
        match (read("width"), read("height")) {
            (Some(width), Some(height)) => Ok((width, height)),
            _ => Err(format!("missing image dimensions for '{}'", mime)),
        }
    }
}

/// A bundle of alternative representations of one value, keyed by MIME type.
/// Serializes as two sibling maps: `data` (mime type to encoded content) and
/// `metadata` (mime type to per-mime metadata such as image dimensions).
#[derive(Debug, Clone, Default)]
pub struct DisplayData {
    pub entries: Vec<(MimeType, String)>,
}

impl DisplayData {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add a representation to the bundle.
    pub fn with(mut self, mime: MimeType, content: impl Into<String>) -> Self {
        self.entries.push((mime, content.into()));
        self
    }

    /// A bundle holding a single plain-text representation.
    pub fn text(content: impl Into<String>) -> Self {
        Self::new().with(MimeType::PlainText, content)
    }
}

// Bundles compare as maps; the order in which representations were added is
// not significant.
impl PartialEq for DisplayData {
    fn eq(&self, other: &Self) -> bool {
        let sorted = |entries: &[(MimeType, String)]| {
            let mut entries = entries.to_vec();
            entries.sort_by(|a, b| a.0.mime().cmp(b.0.mime()));
            entries
        };
        sorted(&self.entries) == sorted(&other.entries)
    }
}

impl Serialize for DisplayData {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut data = Map::new();
        let mut metadata = Map::new();
        for (mime, content) in &self.entries {
            data.insert(mime.mime().to_string(), Value::String(content.clone()));
            if let Some(meta) = mime.wire_metadata() {
                metadata.insert(mime.mime().to_string(), meta);
            }
        }

        let mut map = Map::new();
        map.insert(String::from("data"), Value::Object(data));
        map.insert(String::from("metadata"), Value::Object(metadata));
        map.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DisplayData {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        #[derive(Deserialize)]
        struct RawDisplayData {
            #[serde(default)]
            data: Map<String, Value>,
            #[serde(default)]
            metadata: Map<String, Value>,
        }

        let raw = RawDisplayData::deserialize(deserializer)?;
        let mut entries = Vec::new();
        for (key, value) in raw.data {
            let content = match value.as_str() {
                Some(content) => content.to_string(),
                None => {
                    return Err(D::Error::custom(format!(
                        "display data for '{}' must be a string",
                        key
                    )))
                }
            };
            let mime =
                MimeType::from_wire(&key, raw.metadata.get(&key)).map_err(D::Error::custom)?;
            entries.push((mime, content));
        }
        Ok(DisplayData { entries })
    }
}

impl MessageType for DisplayData {
    fn message_type() -> String {
        String::from("display_data")
    }
}
