//! Prompt resolution - keyword scoring plus a best-effort description
//!
//! Resolution is two independent steps:
//! 1. Score the prompt against every catalog category and pick an asset
//! 2. Ask a [`Describer`] for flavour text, substituting a placeholder on failure
//!
//! Step 1 is pure and always succeeds for a non-empty prompt. Step 2 is a
//! single attempt and never fails the resolution.

use std::future::Future;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, Category, DEFAULT_CATEGORY};

/// Description returned when the text-completion service is unavailable
pub const FALLBACK_DESCRIPTION: &str = "A ready-made 3D model picked to match your prompt. \
     Place it in your space to take a closer look.";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Prompt must not be empty")]
    EmptyPrompt,
}

/// Why the description call did not produce text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DescribeError {
    #[error("Text completion service is not configured")]
    NotConfigured,
    #[error("Text completion request timed out")]
    Timeout,
    #[error("Text completion request failed: {0}")]
    Request(String),
    #[error("Text completion service returned status {0}")]
    Status(u16),
    #[error("Malformed text completion response: {0}")]
    Malformed(String),
}

/// Source of descriptive text for a resolved prompt
///
/// Implementations make at most one upstream attempt per call.
pub trait Describer {
    fn describe(
        &self,
        prompt: &str,
        category: &str,
    ) -> impl Future<Output = Result<String, DescribeError>> + Send;
}

/// Outcome of scoring a prompt against the catalog
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match<'a> {
    /// Winning category, `None` when nothing scored
    pub category: Option<&'a Category>,
    /// Number of distinct keywords of the winner found in the prompt
    pub score: usize,
}

/// Score a prompt against every category
///
/// Each keyword counts once when it occurs anywhere in the lowercased prompt,
/// including inside longer words. The highest score wins; ties keep the
/// category declared first.
pub fn score_prompt<'a>(catalog: &'a Catalog, prompt: &str) -> Match<'a> {
    let lowered = prompt.to_lowercase();
    let tokens: Vec<&str> = lowered.split_whitespace().collect();
    // Collapsed whitespace so multi-word keywords match regardless of spacing
    let normalized = tokens.join(" ");

    let mut best = Match {
        category: None,
        score: 0,
    };

    for category in catalog.categories() {
        let score = category
            .keywords
            .iter()
            .filter(|k| normalized.contains(k.as_str()))
            .count();

        if score > best.score {
            best = Match {
                category: Some(category),
                score,
            };
        }
    }

    debug!(
        tokens = tokens.len(),
        category = best.category.map(|c| c.name.as_str()).unwrap_or("none"),
        score = best.score,
        "Scored prompt"
    );

    best
}

/// Fully resolved prompt
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub asset_url: String,
    pub description: String,
    pub matched_category: String,
    pub used_fallback_description: bool,
    pub score: usize,
}

impl Resolution {
    /// Whether the description came from the text-completion service
    pub fn ai_generated(&self) -> bool {
        !self.used_fallback_description
    }
}

/// Stateless prompt-to-asset service
pub struct PromptService<D> {
    catalog: Catalog,
    describer: D,
}

impl<D: Describer> PromptService<D> {
    pub fn new(catalog: Catalog, describer: D) -> Self {
        Self { catalog, describer }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Choose an asset without contacting the describer
    ///
    /// Returns `(category, url, score)`.
    pub fn select(&self, prompt: &str) -> Result<(String, String, usize), ResolveError> {
        if prompt.trim().is_empty() {
            return Err(ResolveError::EmptyPrompt);
        }

        let found = score_prompt(&self.catalog, prompt);
        Ok(match found.category {
            Some(category) => (category.name.clone(), category.url.clone(), found.score),
            None => (
                DEFAULT_CATEGORY.to_string(),
                self.catalog.default_url().to_string(),
                0,
            ),
        })
    }

    /// Resolve a prompt into an asset URL and description
    pub async fn resolve(&self, prompt: &str) -> Result<Resolution, ResolveError> {
        let (category, url, score) = self.select(prompt)?;

        let described = self.describer.describe(prompt.trim(), &category).await;
        let (description, used_fallback) = match described {
            Ok(text) if !text.trim().is_empty() => (text.trim().to_string(), false),
            Ok(_) => {
                warn!(category = %category, "Empty description, using placeholder");
                (FALLBACK_DESCRIPTION.to_string(), true)
            }
            Err(DescribeError::NotConfigured) => {
                debug!("Describer not configured, using placeholder");
                (FALLBACK_DESCRIPTION.to_string(), true)
            }
            Err(e) => {
                warn!(category = %category, error = %e, "Description failed, using placeholder");
                (FALLBACK_DESCRIPTION.to_string(), true)
            }
        };

        info!(
            category = %category,
            score = score,
            fallback_description = used_fallback,
            "Resolved prompt"
        );

        Ok(Resolution {
            asset_url: url,
            description,
            matched_category: category,
            used_fallback_description: used_fallback,
            score,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Clone)]
    struct MockDescriber {
        calls: Arc<AtomicUsize>,
        reply: Result<String, DescribeError>,
    }

    impl MockDescriber {
        fn ok(text: &str) -> Self {
            Self {
                calls: Arc::new(AtomicUsize::new(0)),
                reply: Ok(text.to_string()),
            }
        }

        fn failing(err: DescribeError) -> Self {
            Self {
                calls: Arc::new(AtomicUsize::new(0)),
                reply: Err(err),
            }
        }
    }

    impl Describer for MockDescriber {
        fn describe(
            &self,
            _prompt: &str,
            _category: &str,
        ) -> impl Future<Output = Result<String, DescribeError>> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let reply = self.reply.clone();
            async move { reply }
        }
    }

    fn url_of(name: &str) -> String {
        Catalog::builtin().get(name).unwrap().url.clone()
    }

    #[test]
    fn test_single_category() {
        let catalog = Catalog::builtin();
        let m = score_prompt(&catalog, "a shiny ROBOT waving");
        assert_eq!(m.category.unwrap().name, "robot");
        assert_eq!(m.score, 1);
    }

    #[test]
    fn test_substring_match() {
        let catalog = Catalog::builtin();
        let m = score_prompt(&catalog, "a dragonfly over the pond");
        assert_eq!(m.category.unwrap().name, "dragon");
    }

    #[test]
    fn test_more_hits_win() {
        let catalog = Catalog::builtin();
        // lantern: 1 ("lantern"), robot: 2 ("robot", "machine")
        let m = score_prompt(&catalog, "robot machine holding a lantern");
        assert_eq!(m.category.unwrap().name, "robot");
        assert_eq!(m.score, 2);

        // lantern: 2 ("lantern", "glow"), robot: 1
        let m = score_prompt(&catalog, "robot with a glowing lantern");
        assert_eq!(m.category.unwrap().name, "lantern");
    }

    #[test]
    fn test_tie_keeps_first_declared() {
        let catalog = Catalog::builtin();
        let m = score_prompt(&catalog, "robot lantern");
        assert_eq!(m.category.unwrap().name, "robot");
        assert_eq!(m.score, 1);

        let m = score_prompt(&catalog, "lantern robot");
        assert_eq!(m.category.unwrap().name, "robot");
    }

    #[test]
    fn test_no_match() {
        let catalog = Catalog::builtin();
        let m = score_prompt(&catalog, "a bowl of soup");
        assert!(m.category.is_none());
        assert_eq!(m.score, 0);
    }

    #[test]
    fn test_multi_word_keyword() {
        let toml = r#"
[default]
url = "https://assets.example.com/cube.glb"

[[category]]
name = "campfire"
keywords = ["camp fire"]
url = "https://assets.example.com/fire.glb"
"#;
        let catalog = Catalog::from_toml(toml).unwrap();
        let m = score_prompt(&catalog, "a  cosy CAMP\tFIRE at night");
        assert_eq!(m.category.unwrap().name, "campfire");
    }

    #[test]
    fn test_multi_word_keyword_with_irregular_spacing() {
        let toml = r#"
[default]
url = "https://assets.example.com/cube.glb"

[[category]]
name = "campfire"
keywords = ["camp   fire", "log\tcabin"]
url = "https://assets.example.com/fire.glb"
"#;
        let catalog = Catalog::from_toml(toml).unwrap();
        let m = score_prompt(&catalog, "a camp fire beside a log cabin");
        assert_eq!(m.category.unwrap().name, "campfire");
        assert_eq!(m.score, 2);
    }

    #[tokio::test]
    async fn test_dragon_scenario() {
        let describer = MockDescriber::ok("A crimson dragon exhaling flame.");
        let service = PromptService::new(Catalog::builtin(), describer.clone());

        let res = service.resolve("A red dragon breathing fire").await.unwrap();
        assert_eq!(res.matched_category, "dragon");
        assert_eq!(res.asset_url, url_of("dragon"));
        assert_eq!(res.description, "A crimson dragon exhaling flame.");
        assert!(res.ai_generated());
        assert_eq!(describer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_description_failure_falls_back() {
        let describer = MockDescriber::failing(DescribeError::Status(503));
        let service = PromptService::new(Catalog::builtin(), describer.clone());

        let res = service.resolve("A red dragon breathing fire").await.unwrap();
        assert_eq!(res.asset_url, url_of("dragon"));
        assert_eq!(res.description, FALLBACK_DESCRIPTION);
        assert!(res.used_fallback_description);
        assert!(!res.ai_generated());
        // Single attempt, no retries
        assert_eq!(describer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_blank_description_falls_back() {
        let service = PromptService::new(Catalog::builtin(), MockDescriber::ok("   "));
        let res = service.resolve("robot").await.unwrap();
        assert!(res.used_fallback_description);
    }

    #[tokio::test]
    async fn test_zero_hits_uses_default() {
        let service = PromptService::new(Catalog::builtin(), MockDescriber::ok("Soup."));
        let res = service.resolve("a bowl of soup").await.unwrap();
        assert_eq!(res.matched_category, DEFAULT_CATEGORY);
        assert_eq!(res.asset_url, Catalog::builtin().default_url());
        assert_eq!(res.score, 0);
    }

    #[test]
    fn test_zero_hits_reports_default_category_name() {
        // Extra keys under [default] are ignored; the fallback is always "default"
        let toml = r#"
[default]
name = "cube"
url = "https://assets.example.com/cube.glb"

[[category]]
name = "robot"
keywords = ["robot"]
url = "https://assets.example.com/robot.glb"
"#;
        let catalog = Catalog::from_toml(toml).unwrap();
        let service = PromptService::new(catalog, MockDescriber::ok("unused"));

        let (category, url, score) = service.select("a bowl of soup").unwrap();
        assert_eq!(category, DEFAULT_CATEGORY);
        assert_eq!(url, "https://assets.example.com/cube.glb");
        assert_eq!(score, 0);
    }

    #[tokio::test]
    async fn test_empty_prompt_rejected_without_call() {
        let describer = MockDescriber::ok("unused");
        let service = PromptService::new(Catalog::builtin(), describer.clone());

        assert_eq!(service.resolve("").await, Err(ResolveError::EmptyPrompt));
        assert_eq!(service.resolve(" \t\n ").await, Err(ResolveError::EmptyPrompt));
        assert_eq!(describer.calls.load(Ordering::SeqCst), 0);
    }
}
