//! Application state management

use anyhow::Result;
use conjure_core::{Catalog, PromptService};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::describe::CompletionClient;

/// Shared application state
pub struct AppState {
    /// Prompt resolution service
    pub service: PromptService<CompletionClient>,
    /// Configuration
    pub config: Config,
}

impl AppState {
    /// Create new application state
    pub fn new(config: Config) -> Result<Arc<Self>> {
        let catalog = load_catalog(&config.catalog.path);
        let describer = CompletionClient::new(&config.completion)?;

        info!(
            categories = catalog.len(),
            default = %catalog.default_url(),
            descriptions = describer.is_configured(),
            "Prompt service ready"
        );

        Ok(Arc::new(Self {
            service: PromptService::new(catalog, describer),
            config,
        }))
    }

    pub fn catalog(&self) -> &Catalog {
        self.service.catalog()
    }
}

/// Load the catalog from file or fall back to the built-in table
fn load_catalog(path: &str) -> Catalog {
    let path = Path::new(path);
    if path.exists() {
        match Catalog::from_file(path) {
            Ok(catalog) => {
                info!(
                    path = %path.display(),
                    count = catalog.len(),
                    "Loaded catalog"
                );
                return catalog;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to load catalog, using built-in");
            }
        }
    } else {
        info!(path = %path.display(), "Catalog not found, using built-in");
    }
    Catalog::builtin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_catalog_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.toml");
        std::fs::write(
            &path,
            r#"
[default]
url = "https://assets.example.com/cube.glb"

[[category]]
name = "chair"
keywords = ["chair", "seat"]
url = "https://assets.example.com/chair.glb"
"#,
        )
        .unwrap();

        let catalog = load_catalog(path.to_str().unwrap());
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.default_url(), "https://assets.example.com/cube.glb");
    }

    #[test]
    fn test_invalid_catalog_falls_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.toml");
        std::fs::write(&path, "[[category]]\nname = \"broken\"\n").unwrap();

        assert_eq!(load_catalog(path.to_str().unwrap()), Catalog::builtin());
    }
}
