//! Delivery API payload types.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ContentError;

/// System metadata attached to every entry, asset and link.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sys {
    /// Object id.
    #[serde(default)]
    pub id: String,
    /// Object type (`Entry`, `Asset`, `Link`, `Array`, `Error`).
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Target type for links (`Entry`, `Asset`, `ContentType`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_type: Option<String>,
    /// Content type of an entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<Box<Link>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

/// A reference to another object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub sys: Sys,
}

impl Link {
    fn new(link_type: &str, id: impl Into<String>) -> Self {
        Self {
            sys: Sys {
                id: id.into(),
                kind: "Link".to_string(),
                link_type: Some(link_type.to_string()),
                ..Default::default()
            },
        }
    }

    /// Link to an entry.
    pub fn entry(id: impl Into<String>) -> Self {
        Self::new("Entry", id)
    }

    /// Link to an asset.
    pub fn asset(id: impl Into<String>) -> Self {
        Self::new("Asset", id)
    }

    /// Link to a content type.
    pub fn content_type(id: impl Into<String>) -> Self {
        Self::new("ContentType", id)
    }

    /// Target id.
    pub fn id(&self) -> &str {
        &self.sys.id
    }

    /// Target type.
    pub fn link_type(&self) -> Option<&str> {
        self.sys.link_type.as_deref()
    }

    /// Serialize into the JSON shape the store uses inside fields.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// A content entry: system metadata plus a bag of fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub sys: Sys,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl Entry {
    /// Create an entry of a content type.
    pub fn new(id: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            sys: Sys {
                id: id.into(),
                kind: "Entry".to_string(),
                content_type: Some(Box::new(Link::content_type(content_type))),
                ..Default::default()
            },
            fields: Map::new(),
        }
    }

    /// Set a field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Entry id.
    pub fn id(&self) -> &str {
        &self.sys.id
    }

    /// Content type id, if known.
    pub fn content_type_id(&self) -> Option<&str> {
        self.sys.content_type.as_ref().map(|link| link.id())
    }

    /// Raw field value.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// String field value.
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// Deserialize a field into a typed value.
    ///
    /// A missing field is `Ok(None)`; a field of the wrong shape is a
    /// `MalformedEntry` error naming the field.
    pub fn field_as<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, ContentError> {
        match self.fields.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| ContentError::malformed(self.id(), name, e.to_string())),
        }
    }

    /// Like [`Entry::field_as`], but a missing field is an error too.
    pub fn required_field<T: DeserializeOwned>(&self, name: &str) -> Result<T, ContentError> {
        self.field_as(name)?
            .ok_or_else(|| ContentError::malformed(self.id(), name, "is missing"))
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

/// File metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageDimensions>,
}

/// The binary file behind an asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetFile {
    /// Usually protocol-relative, e.g. `//images.ctfassets.net/...`.
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<FileDetails>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<AssetFile>,
}

/// A media asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub sys: Sys,
    #[serde(default)]
    pub fields: AssetFields,
}

impl Asset {
    /// Create an image asset.
    pub fn image(id: impl Into<String>, url: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            sys: Sys {
                id: id.into(),
                kind: "Asset".to_string(),
                ..Default::default()
            },
            fields: AssetFields {
                title: None,
                description: None,
                file: Some(AssetFile {
                    url: url.into(),
                    file_name: None,
                    content_type: None,
                    details: Some(FileDetails {
                        size: None,
                        image: Some(ImageDimensions { width, height }),
                    }),
                }),
            },
        }
    }

    /// Set the asset title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.fields.title = Some(title.into());
        self
    }

    /// Asset id.
    pub fn id(&self) -> &str {
        &self.sys.id
    }

    /// Image dimensions, when the file is an image.
    pub fn dimensions(&self) -> Option<ImageDimensions> {
        self.fields.file.as_ref()?.details.as_ref()?.image
    }
}

/// Objects pulled in alongside the items of a collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Includes {
    #[serde(rename = "Entry", default, skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<Entry>,
    #[serde(rename = "Asset", default, skip_serializing_if = "Vec::is_empty")]
    pub assets: Vec<Asset>,
}

/// A page of entries returned by a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryCollection {
    /// Number of entries matching the query across all pages.
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub skip: u64,
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub items: Vec<Entry>,
    #[serde(default)]
    pub includes: Includes,
}

/// Error payload returned by the Delivery API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub sys: Sys,
    #[serde(default)]
    pub message: String,
}
