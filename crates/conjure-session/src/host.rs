//! Spatial host interface
//!
//! The host wraps the platform's XR APIs (capability probe, immersive session,
//! hit-test source, select events) and the render surface. A placement session
//! only ever talks to the platform through this trait.

use std::time::Duration;
use thiserror::Error;

use crate::pose::Pose;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("Capability probe failed: {0}")]
    Probe(String),
    #[error("Immersive session request failed: {0}")]
    SessionRequest(String),
    #[error("Hit-test subscription failed: {0}")]
    HitTest(String),
}

/// Handle to an active hit-test source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HitTestSubscription(pub u64);

/// Platform services consumed by a placement session
pub trait SpatialHost {
    /// Report whether immersive AR is available
    fn probe_ar_support(&mut self) -> Result<bool, HostError>;

    /// Start the immersive session and subscribe to hit-test results
    fn request_hit_test(&mut self) -> Result<HitTestSubscription, HostError>;

    fn cancel_hit_test(&mut self, subscription: HitTestSubscription);

    /// Hook select and resize listeners
    fn attach_listeners(&mut self);

    fn detach_listeners(&mut self);

    /// Give the render surface back to the page
    fn release_surface(&mut self);
}

/// One surface-intersection result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitResult {
    pub pose: Pose,
}

/// Everything the host reports for one tracked frame
#[derive(Debug, Clone, Default)]
pub struct TrackedFrame {
    /// Frame timestamp since session start
    pub time: Duration,
    /// Hit-test results, nearest first
    pub hits: Vec<HitResult>,
    /// Select events dispatched during this frame
    pub selects: usize,
}

impl TrackedFrame {
    pub fn new(time: Duration) -> Self {
        Self {
            time,
            hits: Vec::new(),
            selects: 0,
        }
    }

    pub fn with_hit(mut self, pose: Pose) -> Self {
        self.hits.push(HitResult { pose });
        self
    }

    pub fn with_selects(mut self, selects: usize) -> Self {
        self.selects = selects;
        self
    }
}

/// Host for environments without spatial tracking
///
/// Always reports AR as unsupported, so sessions run in preview mode.
#[derive(Debug, Default)]
pub struct PreviewHost {
    listening: bool,
    released: bool,
}

impl PreviewHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl SpatialHost for PreviewHost {
    fn probe_ar_support(&mut self) -> Result<bool, HostError> {
        Ok(false)
    }

    fn request_hit_test(&mut self) -> Result<HitTestSubscription, HostError> {
        Err(HostError::SessionRequest("spatial tracking unavailable".to_string()))
    }

    fn cancel_hit_test(&mut self, _subscription: HitTestSubscription) {}

    fn attach_listeners(&mut self) {
        self.listening = true;
    }

    fn detach_listeners(&mut self) {
        self.listening = false;
    }

    fn release_surface(&mut self) {
        self.released = true;
    }
}
