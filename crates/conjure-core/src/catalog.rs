//! Asset catalog - Maps keyword categories to 3D model URLs
//!
//! Categories are declared in order; that order is significant because ties
//! during prompt scoring resolve to the category declared first. The catalog is
//! immutable once constructed and is handed to the prompt service by value.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Category name reported when no keyword matched
pub const DEFAULT_CATEGORY: &str = "default";

const KHRONOS_MODELS: &str =
    "https://raw.githubusercontent.com/KhronosGroup/glTF-Sample-Assets/main/Models";

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse catalog: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to serialize catalog: {0}")]
    SerializeError(#[from] toml::ser::Error),
    #[error("Category at position {0} has an empty name")]
    EmptyName(usize),
    #[error("Duplicate category: {0}")]
    DuplicateCategory(String),
    #[error("Category {0} has no keywords")]
    NoKeywords(String),
    #[error("Category {0} has an empty asset URL")]
    EmptyUrl(String),
    #[error("Category name \"{0}\" is reserved for the fallback asset")]
    ReservedName(String),
}

/// A keyword bucket mapped to one asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Category name (e.g., "dragon"), reported back as the model type
    pub name: String,
    /// Trigger keywords, matched as substrings of the lowercased prompt
    pub keywords: Vec<String>,
    /// URL of the GLB/glTF asset served for this category
    pub url: String,
    /// Short human-readable label
    #[serde(default)]
    pub description: Option<String>,
}

/// Asset used when no category matches or a load has to fall back
///
/// Always reported under [`DEFAULT_CATEGORY`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultAsset {
    pub url: String,
}

fn default_version() -> String {
    "1.0".to_string()
}

/// On-disk layout of a catalog file
#[derive(Debug, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default = "default_version")]
    version: String,
    default: DefaultAsset,
    #[serde(default)]
    category: Vec<Category>,
}

/// Immutable keyword lookup table
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    version: String,
    default: DefaultAsset,
    categories: Vec<Category>,
}

impl Catalog {
    /// Build a catalog, normalizing keywords to lowercase
    pub fn new(default: DefaultAsset, categories: Vec<Category>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(categories.len());

        for (idx, mut category) in categories.into_iter().enumerate() {
            let name = category.name.trim().to_string();
            if name.is_empty() {
                return Err(CatalogError::EmptyName(idx));
            }
            if name.eq_ignore_ascii_case(DEFAULT_CATEGORY) {
                return Err(CatalogError::ReservedName(name));
            }
            if !seen.insert(name.to_lowercase()) {
                return Err(CatalogError::DuplicateCategory(name));
            }
            if category.url.trim().is_empty() {
                return Err(CatalogError::EmptyUrl(name));
            }

            category.keywords = category
                .keywords
                .iter()
                .map(|k| normalize_keyword(k))
                .filter(|k| !k.is_empty())
                .collect();
            if category.keywords.is_empty() {
                return Err(CatalogError::NoKeywords(name));
            }

            category.name = name;
            normalized.push(category);
        }

        if default.url.trim().is_empty() {
            return Err(CatalogError::EmptyUrl(DEFAULT_CATEGORY.to_string()));
        }

        Ok(Self {
            version: default_version(),
            default,
            categories: normalized,
        })
    }

    /// Load a catalog from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(content)?;
        let mut catalog = Self::new(file.default, file.category)?;
        catalog.version = file.version;
        Ok(catalog)
    }

    /// Load a catalog from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Serialize back to TOML
    pub fn to_toml(&self) -> Result<String, CatalogError> {
        let file = CatalogFile {
            version: self.version.clone(),
            default: self.default.clone(),
            category: self.categories.clone(),
        };
        Ok(toml::to_string_pretty(&file)?)
    }

    /// The stock catalog shipped with Conjure
    pub fn builtin() -> Self {
        let khronos = |path: &str| format!("{}/{}", KHRONOS_MODELS, path);
        let category = |name: &str, keywords: &[&str], url: &str, description: &str| Category {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            url: url.to_string(),
            description: Some(description.to_string()),
        };

        let categories = vec![
            category(
                "dragon",
                &["dragon", "wyvern", "drake", "serpent"],
                &khronos("DragonAttenuation/glTF-Binary/DragonAttenuation.glb"),
                "Glass dragon",
            ),
            category(
                "robot",
                &["robot", "droid", "android", "mech", "machine"],
                "https://threejs.org/examples/models/gltf/RobotExpressive/RobotExpressive.glb",
                "Expressive robot",
            ),
            category(
                "car",
                &["car", "truck", "vehicle", "automobile"],
                &khronos("ToyCar/glTF-Binary/ToyCar.glb"),
                "Toy car",
            ),
            category(
                "spaceship",
                &["spaceship", "starship", "rocket", "ufo", "space"],
                &khronos("SciFiHelmet/glTF/SciFiHelmet.gltf"),
                "Sci-fi helmet",
            ),
            category(
                "tree",
                &["tree", "plant", "forest", "flower"],
                &khronos("DiffuseTransmissionPlant/glTF-Binary/DiffuseTransmissionPlant.glb"),
                "Potted plant",
            ),
            category(
                "house",
                &["house", "home", "building", "cabin", "city"],
                "https://threejs.org/examples/models/gltf/LittlestTokyo.glb",
                "Littlest Tokyo",
            ),
            category(
                "animal",
                &["animal", "fox", "dog", "wolf", "horse", "pet"],
                &khronos("Fox/glTF-Binary/Fox.glb"),
                "Low-poly fox",
            ),
            category(
                "lantern",
                &["lantern", "lamp", "light", "glow"],
                &khronos("Lantern/glTF-Binary/Lantern.glb"),
                "Hanging lantern",
            ),
        ];

        Self {
            version: default_version(),
            default: DefaultAsset {
                url: "https://modelviewer.dev/shared-assets/models/Astronaut.glb".to_string(),
            },
            categories,
        }
    }

    /// Categories in declaration order
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// The default asset
    pub fn default_asset(&self) -> &DefaultAsset {
        &self.default
    }

    /// URL of the default asset
    pub fn default_url(&self) -> &str {
        &self.default.url
    }

    /// Find a category by name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&Category> {
        self.categories
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Lowercase and collapse internal whitespace, matching how prompts are scored
fn normalize_keyword(keyword: &str) -> String {
    keyword
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}
