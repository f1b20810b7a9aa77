use std::fmt;

use wfc_core::ModelError;

/// Error type for sample and tileset loading.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadError {
    /// File not found or cannot be read
    FileNotFound(String),
    /// XML parsing error
    XmlError(String),
    /// Missing required attribute
    MissingAttribute { element: String, attribute: String },
    /// Invalid attribute value
    InvalidAttribute {
        element: String,
        attribute: String,
        value: String,
        reason: String,
    },
    /// Neighbor rule names a tile the tileset does not declare
    UnknownTile { name: String, context: String },
    /// Tileset declares no tiles
    EmptyTileset(String),
    /// The solver rejected the loaded configuration
    Model(ModelError),
}

impl From<ModelError> for LoadError {
    fn from(e: ModelError) -> Self {
        LoadError::Model(e)
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::FileNotFound(path) => write!(f, "file not found: {}", path),
            LoadError::XmlError(msg) => write!(f, "XML error: {}", msg),
            LoadError::MissingAttribute { element, attribute } => {
                write!(f, "missing attribute '{}' in <{}>", attribute, element)
            }
            LoadError::InvalidAttribute {
                element,
                attribute,
                value,
                reason,
            } => write!(
                f,
                "invalid value '{}' for attribute '{}' in <{}>: {}",
                value, attribute, element, reason
            ),
            LoadError::UnknownTile { name, context } => {
                write!(f, "unknown tile '{}' in {}", name, context)
            }
            LoadError::EmptyTileset(path) => write!(f, "tileset {} has no tiles", path),
            LoadError::Model(e) => write!(f, "model error: {}", e),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Model(e) => Some(e),
            _ => None,
        }
    }
}
