use sun_formats::StageParams;

use crate::callbacks::CallbackRegistry;
use crate::context::{AppContext, ContextId};
use crate::director::{Director, DirectorKind};
use crate::params;
use crate::services::DrawSurface;

pub type StageInitFn = Box<dyn FnMut(&mut dyn Director)>;
pub type StageUpdateFn = Box<dyn FnMut(&mut dyn Director)>;
pub type StageDrawFn = Box<dyn FnMut(&mut dyn Director, &mut dyn DrawSurface)>;
pub type StageExitFn = Box<dyn FnMut(&mut dyn Director)>;

/// The stage-lifecycle callback pipeline.
///
/// Extensions hook a stage's life without the loop knowing their
/// identities. The four registries are process-wide: a stage session resets
/// its flag state and configuration on entry and exit, the callback lists
/// themselves persist across sessions.
#[derive(Default)]
pub struct StagePipeline {
    init: CallbackRegistry<StageInitFn>,
    update: CallbackRegistry<StageUpdateFn>,
    draw: CallbackRegistry<StageDrawFn>,
    exit: CallbackRegistry<StageExitFn>,
    initialized: bool,
    params: Option<StageParams>,
}

impl StagePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_init(&mut self, callback: StageInitFn) {
        self.init.register(callback);
    }

    pub fn register_update(&mut self, callback: StageUpdateFn) {
        self.update.register(callback);
    }

    pub fn register_draw(&mut self, callback: StageDrawFn) {
        self.draw.register(callback);
    }

    pub fn register_exit(&mut self, callback: StageExitFn) {
        self.exit.register(callback);
    }

    /// The configuration resolved for the live stage session, if any stage
    /// has been entered since startup.
    pub fn config(&self) -> Option<&StageParams> {
        self.params.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Stage entry: the freshly resolved configuration is installed, init
    /// callbacks fire in registration order against the new director, stage
    /// objects are constructed, and only then is the session marked live.
    pub(crate) fn begin_session(&mut self, params: StageParams, director: &mut dyn Director) {
        self.params = Some(params);
        for callback in self.init.iter_mut() {
            callback(&mut *director);
        }
        director.setup_objects();
        self.initialized = true;
    }

    /// Per-simulation-frame hook. A complete no-op unless the stage session
    /// finished initialization, the application context is exactly the
    /// direct-stage phase and the live director is the stage director.
    pub(crate) fn run_update(&mut self, context: ContextId, director: &mut dyn Director) {
        if !self.initialized {
            return;
        }
        if context != AppContext::DirectStage {
            return;
        }
        if director.kind() != DirectorKind::Stage {
            return;
        }
        for callback in self.update.iter_mut() {
            callback(&mut *director);
        }
    }

    /// Per-render-frame hook inside the 2D overlay pass.
    pub(crate) fn run_draw(&mut self, director: &mut dyn Director, surface: &mut dyn DrawSurface) {
        surface.setup_2d();
        for callback in self.draw.iter_mut() {
            callback(&mut *director, &mut *surface);
        }
    }

    /// Stage exit. Gated on the context at exit time: leaving any other
    /// phase leaves the pipeline untouched. Exit callbacks fire before the
    /// configuration resets to defaults and before the session flag clears.
    pub(crate) fn end_session(&mut self, context: ContextId, director: &mut dyn Director) {
        if context != AppContext::DirectStage {
            return;
        }
        for callback in self.exit.iter_mut() {
            callback(&mut *director);
        }
        if let Some(params) = self.params.as_mut() {
            *params = StageParams::default();
        }
        self.initialized = false;
    }

    pub fn is_ex_stage(&self, area: u8) -> bool {
        params::classify_ex(self.params.as_ref(), area)
    }

    pub fn is_diving_stage(&self, area: u8) -> bool {
        params::classify_diving(self.params.as_ref(), area)
    }

    pub fn is_multiplayer_stage(&self, area: u8, episode: u8) -> bool {
        params::classify_multiplayer(self.params.as_ref(), area, episode)
    }

    pub fn is_option_stage(&self, area: u8) -> bool {
        params::classify_option(self.params.as_ref(), area)
    }
}
