use std::collections::BTreeMap;

use crate::error::CidError;

pub trait FormatRegistry: Send + Sync {
    /// Extension without the leading dot, or `None` for unknown tags.
    fn extension(&self, format: &str) -> Option<String>;

    fn require_extension(&self, format: &str) -> Result<String, CidError> {
        self.extension(format)
            .ok_or_else(|| CidError::UnknownFormat(format.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatTable {
    extensions: BTreeMap<String, String>,
}

impl FormatTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut table = Self::new();
        for (format, extension) in BUILTIN_FORMATS {
            table.insert(format, extension);
        }
        table
    }

    pub fn insert(&mut self, format: &str, extension: &str) {
        let extension = extension.trim().trim_start_matches('.');
        self.extensions
            .insert(format.trim().to_string(), extension.to_string());
    }
}

impl FormatRegistry for FormatTable {
    fn extension(&self, format: &str) -> Option<String> {
        self.extensions.get(format.trim()).cloned()
    }
}

const BUILTIN_FORMATS: [(&str, &str); 7] = [
    ("imagetiff", "tif"),
    ("tif", "tif"),
    ("tiff", "tif"),
    ("tablecsv", "csv"),
    ("numbercsv", "csv"),
    ("arraycsv", "csv"),
    ("movietxt", "txt"),
];
