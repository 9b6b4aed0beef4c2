//! Scene graph pieces owned by a placement session

use std::sync::Arc;
use std::time::Duration;

use crate::pose::Pose;

/// Decoded mesh data, immutable once loaded
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Geometry {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

/// A node in a loaded model's hierarchy
///
/// Cloning a node copies the whole hierarchy. Geometry buffers are shared
/// read-only; transform, scale, and visibility are per copy.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub name: String,
    pub transform: Pose,
    pub scale: f32,
    pub visible: bool,
    pub geometry: Option<Arc<Geometry>>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Pose::IDENTITY,
            scale: 1.0,
            visible: true,
            geometry: None,
            children: Vec::new(),
        }
    }

    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = Some(Arc::new(geometry));
        self
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    /// Spin the node about its vertical axis
    pub fn rotate_y(&mut self, angle: f32) {
        self.transform = self.transform * Pose::from_rotation_y(angle);
    }

    /// Number of nodes in this subtree, including self
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(SceneNode::node_count).sum::<usize>()
    }
}

/// Surface indicator driven by hit-test results
#[derive(Debug, Clone, Default)]
pub struct Reticle {
    visible: bool,
    pose: Pose,
}

impl Reticle {
    pub fn show(&mut self, pose: Pose) {
        self.visible = true;
        self.pose = pose;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Current pose, only while visible
    pub fn pose(&self) -> Option<Pose> {
        self.visible.then_some(self.pose)
    }
}

/// One-shot grow-and-settle scale animation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalePulse {
    pub started_at: Duration,
    pub duration: Duration,
    /// Scale factor at the start of the pulse (1.2 = 20% larger)
    pub peak: f32,
}

impl ScalePulse {
    /// Scale multiplier at `now`, or `None` once the pulse has finished
    pub fn factor_at(&self, now: Duration) -> Option<f32> {
        let elapsed = now.saturating_sub(self.started_at);
        if self.duration.is_zero() || elapsed >= self.duration {
            return None;
        }
        let t = elapsed.as_secs_f32() / self.duration.as_secs_f32();
        // Ease-out cubic back to 1.0
        let eased = 1.0 - (1.0 - t).powi(3);
        Some(self.peak - (self.peak - 1.0) * eased)
    }
}

/// A template copy placed into the world
#[derive(Debug, Clone)]
pub struct PlacedInstance {
    pub node: SceneNode,
    pub placed_at: Duration,
    base_scale: f32,
    pulse: Option<ScalePulse>,
}

impl PlacedInstance {
    pub(crate) fn new(
        mut node: SceneNode,
        pose: Pose,
        placed_at: Duration,
        pulse: ScalePulse,
    ) -> Self {
        let base_scale = node.scale;
        node.transform = pose;
        node.visible = true;
        node.scale = base_scale * pulse.peak;
        Self {
            node,
            placed_at,
            base_scale,
            pulse: Some(pulse),
        }
    }

    pub fn pose(&self) -> Pose {
        self.node.transform
    }

    pub fn is_pulsing(&self) -> bool {
        self.pulse.is_some()
    }

    /// Step the pulse; settles on the base scale when it ends
    pub(crate) fn advance(&mut self, now: Duration) {
        let Some(pulse) = self.pulse else {
            return;
        };
        match pulse.factor_at(now) {
            Some(factor) => self.node.scale = self.base_scale * factor,
            None => {
                self.node.scale = self.base_scale;
                self.pulse = None;
            }
        }
    }
}
