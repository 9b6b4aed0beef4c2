//! Placement session lifecycle
//!
//! A session is driven entirely from one thread: the embedder calls
//! [`PlacementSession::on_tracked_frame`] or [`PlacementSession::on_untracked_tick`]
//! once per display refresh, and feeds load results back through
//! [`PlacementSession::complete_load`] (or lets [`load_asset`] do it).
//!
//! ```text
//! Uninitialized --start()--> Tracking    (host supports AR)
//!               --start()--> Previewing  (unsupported or probe failed)
//! Tracking | Previewing --end()--> Ended (terminal)
//! ```

use std::cell::RefCell;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::asset::{
    AssetFetcher, AssetLoadError, LoadError, LoadProgress, LoadStatus, LoadStep, LoadTicket,
};
use crate::host::{HitTestSubscription, SpatialHost, TrackedFrame};
use crate::scene::{PlacedInstance, Reticle, ScalePulse, SceneNode};

/// Per-attempt asset load timeout
pub const LOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Preview rotation applied per untracked tick, in radians
pub const PREVIEW_ROTATION_STEP: f32 = 0.01;

pub const PULSE_DURATION: Duration = Duration::from_millis(300);

pub const PULSE_PEAK: f32 = 1.2;

/// Tunables for a placement session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Asset loaded when the requested one fails
    pub default_asset_url: String,
    pub load_timeout: Duration,
    pub rotation_step: f32,
    pub pulse_duration: Duration,
    pub pulse_peak: f32,
}

impl SessionConfig {
    pub fn new(default_asset_url: impl Into<String>) -> Self {
        Self {
            default_asset_url: default_asset_url.into(),
            load_timeout: LOAD_TIMEOUT,
            rotation_step: PREVIEW_ROTATION_STEP,
            pulse_duration: PULSE_DURATION,
            pulse_peak: PULSE_PEAK,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    /// No spatial tracking; the template spins in place
    Previewing,
    /// Immersive AR with hit testing
    Tracking,
    Ended,
}

impl SessionState {
    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Previewing | SessionState::Tracking)
    }
}

/// Result of a placement request
///
/// Only `Placed` changes the scene; the rest are silent no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Index of the new instance
    Placed(usize),
    NoReticle,
    NoTemplate,
    /// Session is not tracking
    Inactive,
}

/// One AR placement view
pub struct PlacementSession<H: SpatialHost> {
    id: Uuid,
    host: H,
    config: SessionConfig,
    state: SessionState,
    template: Option<SceneNode>,
    load: LoadStatus,
    reticle: Reticle,
    placed: Vec<PlacedInstance>,
    hit_test: Option<HitTestSubscription>,
    listening: bool,
    last_frame: Duration,
}

impl<H: SpatialHost> PlacementSession<H> {
    pub fn new(host: H, config: SessionConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            host,
            config,
            state: SessionState::Uninitialized,
            template: None,
            load: LoadStatus::default(),
            reticle: Reticle::default(),
            placed: Vec::new(),
            hit_test: None,
            listening: false,
            last_frame: Duration::ZERO,
        }
    }

    /// Probe the host and enter tracked or preview mode
    ///
    /// Probe and subscription failures downgrade to preview. Calling this on a
    /// started or ended session does nothing.
    pub fn start(&mut self) -> SessionState {
        if self.state != SessionState::Uninitialized {
            return self.state;
        }

        let supported = match self.host.probe_ar_support() {
            Ok(supported) => supported,
            Err(e) => {
                warn!(session = %self.id, error = %e, "AR capability probe failed, using preview");
                false
            }
        };

        self.state = if supported {
            match self.host.request_hit_test() {
                Ok(subscription) => {
                    self.hit_test = Some(subscription);
                    SessionState::Tracking
                }
                Err(e) => {
                    warn!(session = %self.id, error = %e, "Hit-test setup failed, using preview");
                    SessionState::Previewing
                }
            }
        } else {
            SessionState::Previewing
        };

        self.host.attach_listeners();
        self.listening = true;

        info!(session = %self.id, state = ?self.state, "Session started");
        self.state
    }

    /// Tear the session down; safe to call repeatedly
    ///
    /// Returns `true` if this call performed the teardown.
    pub fn end(&mut self) -> bool {
        if self.state == SessionState::Ended {
            return false;
        }

        if let Some(subscription) = self.hit_test.take() {
            self.host.cancel_hit_test(subscription);
        }
        if self.listening {
            self.host.detach_listeners();
            self.listening = false;
        }
        self.host.release_surface();

        self.reticle.hide();
        self.load.pending = false;
        self.state = SessionState::Ended;

        info!(session = %self.id, placed = self.placed.len(), "Session ended");
        true
    }

    /// Start loading a new template, superseding any load in flight
    ///
    /// The current template is discarded immediately. Returns `None` once the
    /// session has ended.
    pub fn begin_load(&mut self, url: &str) -> Option<LoadTicket> {
        if self.state == SessionState::Ended {
            return None;
        }

        let generation = self.load.generation + 1;
        if self.load.pending {
            debug!(
                session = %self.id,
                superseded = self.load.generation,
                generation = generation,
                "Superseding pending load"
            );
        }

        self.template = None;
        self.load = LoadStatus {
            generation,
            url: Some(url.to_string()),
            progress: 0,
            last_error: None,
            pending: true,
        };

        info!(session = %self.id, generation = generation, url = %url, "Loading asset");
        Some(LoadTicket {
            generation,
            url: url.to_string(),
            timeout: self.config.load_timeout,
        })
    }

    /// Record transport progress for an attempt
    pub fn on_load_progress(&mut self, generation: u64, progress: LoadProgress) {
        if !self.is_current(generation) {
            return;
        }
        if let Some(pct) = progress.percent() {
            self.load.progress = self.load.progress.max(pct);
        }
    }

    /// Deliver the result of an attempt
    pub fn complete_load(
        &mut self,
        generation: u64,
        result: Result<SceneNode, LoadError>,
    ) -> LoadStep {
        if !self.is_current(generation) {
            debug!(session = %self.id, generation = generation, "Ignoring stale load result");
            return LoadStep::Stale;
        }

        let url = self.load.url.clone().unwrap_or_default();
        match result {
            Ok(node) => {
                info!(session = %self.id, url = %url, nodes = node.node_count(), "Asset loaded");
                self.template = Some(node);
                self.load.progress = 100;
                self.load.pending = false;
                LoadStep::Installed { url }
            }
            Err(e) if url != self.config.default_asset_url => {
                warn!(
                    session = %self.id,
                    url = %url,
                    error = %e,
                    "Asset load failed, retrying with default"
                );
                let default_url = self.config.default_asset_url.clone();
                match self.begin_load(&default_url) {
                    Some(ticket) => LoadStep::Retry(ticket),
                    None => LoadStep::Stale,
                }
            }
            Err(e) => {
                warn!(session = %self.id, url = %url, error = %e, "Default asset failed to load");
                self.template = None;
                self.load.pending = false;
                self.load.last_error = Some(e.to_string());
                LoadStep::Failed(AssetLoadError { url, source: e })
            }
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.state != SessionState::Ended && self.load.pending && generation == self.load.generation
    }

    /// Process one tracked frame
    ///
    /// The reticle is updated first, then any selects from the same frame are
    /// placed, then running scale pulses advance.
    pub fn on_tracked_frame(&mut self, frame: &TrackedFrame) -> Vec<Placement> {
        if self.state != SessionState::Tracking {
            return Vec::new();
        }
        self.last_frame = frame.time;

        match frame.hits.first() {
            Some(hit) => self.reticle.show(hit.pose),
            None => self.reticle.hide(),
        }

        let placements = (0..frame.selects).map(|_| self.place()).collect();

        for instance in &mut self.placed {
            instance.advance(frame.time);
        }

        placements
    }

    /// Process one frame in preview mode
    pub fn on_untracked_tick(&mut self) {
        if self.state != SessionState::Previewing {
            return;
        }
        if let Some(template) = self.template.as_mut() {
            template.rotate_y(self.config.rotation_step);
        }
    }

    /// Place a copy of the template at the reticle
    pub fn place(&mut self) -> Placement {
        if self.state != SessionState::Tracking {
            return Placement::Inactive;
        }
        let Some(pose) = self.reticle.pose() else {
            debug!(session = %self.id, "Select ignored, no surface under reticle");
            return Placement::NoReticle;
        };
        let Some(template) = self.template.as_ref() else {
            debug!(session = %self.id, "Select ignored, no template loaded");
            return Placement::NoTemplate;
        };

        let pulse = ScalePulse {
            started_at: self.last_frame,
            duration: self.config.pulse_duration,
            peak: self.config.pulse_peak,
        };
        self.placed
            .push(PlacedInstance::new(template.clone(), pose, self.last_frame, pulse));

        let index = self.placed.len() - 1;
        debug!(session = %self.id, index = index, "Placed instance");
        Placement::Placed(index)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn template(&self) -> Option<&SceneNode> {
        self.template.as_ref()
    }

    pub fn load_status(&self) -> &LoadStatus {
        &self.load
    }

    pub fn reticle(&self) -> &Reticle {
        &self.reticle
    }

    /// Placed instances in placement order
    pub fn placed(&self) -> &[PlacedInstance] {
        &self.placed
    }

    pub fn placed_mut(&mut self, index: usize) -> Option<&mut PlacedInstance> {
        self.placed.get_mut(index)
    }

    pub fn host(&self) -> &H {
        &self.host
    }
}

impl<H: SpatialHost> Drop for PlacementSession<H> {
    fn drop(&mut self) {
        self.end();
    }
}

/// How a [`load_asset`] call ended
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Installed { url: String, used_default: bool },
    /// A newer load took over before this one finished
    Superseded,
    Failed(AssetLoadError),
    /// Session had already ended
    Inactive,
}

/// Load `url` into the session, with timeout and default-asset fallback
///
/// The session is borrowed only between suspension points, so frames and newer
/// loads can run while a fetch is outstanding.
pub async fn load_asset<H, F>(
    session: &RefCell<PlacementSession<H>>,
    fetcher: &F,
    url: &str,
) -> LoadOutcome
where
    H: SpatialHost,
    F: AssetFetcher,
{
    let Some(mut ticket) = session.borrow_mut().begin_load(url) else {
        return LoadOutcome::Inactive;
    };
    let mut used_default = false;

    loop {
        let generation = ticket.generation;
        let on_progress = |progress: LoadProgress| {
            session.borrow_mut().on_load_progress(generation, progress);
        };

        let result = match tokio::time::timeout(
            ticket.timeout,
            fetcher.fetch(&ticket.url, &on_progress),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(LoadError::Timeout(ticket.timeout)),
        };

        let step = session.borrow_mut().complete_load(generation, result);
        match step {
            LoadStep::Installed { url } => return LoadOutcome::Installed { url, used_default },
            LoadStep::Retry(next) => {
                ticket = next;
                used_default = true;
            }
            LoadStep::Failed(e) => return LoadOutcome::Failed(e),
            LoadStep::Stale if session.borrow().state() == SessionState::Ended => {
                return LoadOutcome::Inactive;
            }
            LoadStep::Stale => return LoadOutcome::Superseded,
        }
    }
}
