// src/recipe/data.rs

//! Metadata blob stored alongside each recipe record

use serde::{Deserialize, Serialize};

/// Version recorded for direct uploads, which carry no manifest
pub const UPLOAD_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Icons {
    pub png: String,
    pub svg: String,
}

/// `data` column contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeData {
    pub author: String,
    pub featured: bool,
    pub version: String,
    pub icons: Icons,
}

impl RecipeData {
    /// Metadata for a freshly submitted, not yet featured recipe
    pub fn new(author: impl Into<String>, version: impl Into<String>, icons: Icons) -> Self {
        Self {
            author: author.into(),
            featured: false,
            version: version.into(),
            icons,
        }
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let data = RecipeData::new(
            "bar",
            UPLOAD_VERSION,
            Icons {
                png: "https://example.com/foo.png".to_string(),
                svg: "https://example.com/foo.svg".to_string(),
            },
        );

        let value: serde_json::Value = serde_json::from_str(&data.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "author": "bar",
                "featured": false,
                "version": "1.0.0",
                "icons": {
                    "png": "https://example.com/foo.png",
                    "svg": "https://example.com/foo.svg"
                }
            })
        );
    }
}
