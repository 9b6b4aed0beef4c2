//! Conjure Core - Keyword catalog and prompt resolution
//!
//! This crate provides the server-side half of Conjure:
//! - Catalog of asset categories, each with trigger keywords and a model URL
//! - Keyword scoring that maps free-text prompts onto a category
//! - Prompt service that pairs the chosen asset with a best-effort description

pub mod catalog;
pub mod resolve;

pub use catalog::{Catalog, CatalogError, Category, DefaultAsset, DEFAULT_CATEGORY};
pub use resolve::{
    score_prompt, DescribeError, Describer, Match, PromptService, Resolution, ResolveError,
    FALLBACK_DESCRIPTION,
};
