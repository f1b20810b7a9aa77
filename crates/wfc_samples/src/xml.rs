//! Attribute helpers shared by the sample and tileset readers.

use std::collections::HashMap;
use std::str::FromStr;

use quick_xml::events::BytesStart;

use crate::error::LoadError;

/// Element name as String.
pub(crate) fn element_name(e: &BytesStart) -> Result<String, LoadError> {
    std::str::from_utf8(e.name().as_ref())
        .map_err(|err| LoadError::XmlError(format!("invalid UTF-8: {}", err)))
        .map(|s| s.to_string())
}

/// Attributes of one element, keyed by name.
#[derive(Debug)]
pub(crate) struct Attributes {
    element: String,
    values: HashMap<String, String>,
}

impl Attributes {
    pub(crate) fn parse(e: &BytesStart) -> Result<Self, LoadError> {
        let element = element_name(e)?;
        let mut values = HashMap::new();
        for attr_result in e.attributes() {
            let attr =
                attr_result.map_err(|e| LoadError::XmlError(format!("attribute error: {}", e)))?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| LoadError::XmlError(format!("invalid UTF-8 in attribute key: {}", e)))?
                .to_string();
            let value = std::str::from_utf8(&attr.value)
                .map_err(|e| {
                    LoadError::XmlError(format!("invalid UTF-8 in attribute value: {}", e))
                })?
                .to_string();
            values.insert(key, value);
        }
        Ok(Self { element, values })
    }

    pub(crate) fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub(crate) fn required(&self, key: &str) -> Result<&str, LoadError> {
        self.get(key).ok_or_else(|| LoadError::MissingAttribute {
            element: self.element.clone(),
            attribute: key.to_string(),
        })
    }

    /// Parse `key` with `FromStr`, falling back to `default` when absent.
    pub(crate) fn parse_or<T>(&self, key: &str, default: T) -> Result<T, LoadError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            None => Ok(default),
            Some(value) => value.parse().map_err(|e: T::Err| self.invalid(key, value, e)),
        }
    }

    /// `True/true/False/false`, falling back to `default` when absent.
    pub(crate) fn bool_or(&self, key: &str, default: bool) -> Result<bool, LoadError> {
        match self.get(key) {
            None => Ok(default),
            Some("True" | "true") => Ok(true),
            Some("False" | "false") => Ok(false),
            Some(value) => Err(self.invalid(key, value, "expected True or False")),
        }
    }

    pub(crate) fn invalid(
        &self,
        key: &str,
        value: &str,
        reason: impl std::fmt::Display,
    ) -> LoadError {
        LoadError::InvalidAttribute {
            element: self.element.clone(),
            attribute: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}
