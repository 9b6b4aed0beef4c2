//! Conjure Session - AR placement on top of an injected spatial host
//!
//! This crate owns the client-side state of one placement view:
//! - Session lifecycle (capability probe, tracked or preview mode, teardown)
//! - Template asset loading with timeout, default-asset fallback, and
//!   generation-guarded supersession
//! - Per-frame reticle tracking from hit-test results
//! - Clone-on-select placement with a short scale pulse
//!
//! Rendering, glTF decoding, and the platform XR bindings are supplied by the
//! embedder through [`SpatialHost`], [`AssetFetcher`], and [`SceneDecoder`].

pub mod asset;
pub mod host;
pub mod pose;
pub mod scene;
pub mod session;

pub use asset::{
    AssetFetcher, AssetLoadError, HttpAssetFetcher, LoadError, LoadProgress, LoadStatus, LoadStep,
    LoadTicket, SceneDecoder,
};
pub use host::{HitResult, HitTestSubscription, HostError, PreviewHost, SpatialHost, TrackedFrame};
pub use pose::Pose;
pub use scene::{Geometry, PlacedInstance, Reticle, ScalePulse, SceneNode};
pub use session::{
    load_asset, LoadOutcome, Placement, PlacementSession, SessionConfig, SessionState,
};
