use std::mem;

use anyhow::Result;
use serde::Serialize;

use crate::callbacks::CallbackRegistry;
use crate::context::{AppContext, ContextDispatchTable, ContextId};
use crate::director::{Director, DirectorKind};
use crate::handlers;
use crate::params::StageParamsResolver;
use crate::scene::{SceneDescriptor, EPISODE_UNSET};
use crate::services::{DrawSurface, EventLog, FrameDriver, HostServices};
use crate::stage::StagePipeline;

/// Application-level extension hook: fired by the loop at the boot points
/// and after every frame body ("context changed").
pub type AppCallback = Box<dyn FnMut(&mut Application)>;

/// Startup configuration, settable once before the loop runs.
#[derive(Debug, Clone)]
pub struct AppOptions {
    pub debug_mode: bool,
    pub show_settings_on_first_boot: bool,
    pub first_boot: bool,
    pub intro_area: u8,
    pub intro_episode: u8,
}

impl Default for AppOptions {
    fn default() -> Self {
        AppOptions {
            debug_mode: false,
            show_settings_on_first_boot: false,
            first_boot: false,
            intro_area: sun_formats::areas::OPTION,
            intro_episode: 0,
        }
    }
}

/// All process-wide mutable state of the controller, consolidated into one
/// explicitly-owned value so ownership and test isolation stay visible.
pub struct Application {
    pub context: ContextId,
    pub director: Option<Box<dyn Director>>,
    pub current_scene: SceneDescriptor,
    pub previous_scene: SceneDescriptor,
    pub next_scene: SceneDescriptor,
    pub cut_scene_id: u8,
    pub debug_mode: bool,
    pub services: HostServices,
    pub resolver: StageParamsResolver,
    pub stage: StagePipeline,
    pub(crate) additional_movie: bool,
    show_settings_on_boot: bool,
    first_boot: bool,
    intro_area: u8,
    intro_episode: u8,
    queued_secret_movie: bool,
    needs_shutdown: bool,
    init_callbacks: CallbackRegistry<AppCallback>,
    boot_callbacks: CallbackRegistry<AppCallback>,
    change_callbacks: CallbackRegistry<AppCallback>,
    events: EventLog,
}

impl Application {
    pub fn new(
        options: AppOptions,
        services: HostServices,
        resolver: StageParamsResolver,
        events: EventLog,
    ) -> Self {
        let unset = SceneDescriptor::new(0, EPISODE_UNSET, 0);
        Application {
            context: AppContext::GameBoot.into(),
            director: None,
            current_scene: unset,
            previous_scene: unset,
            next_scene: unset,
            cut_scene_id: 0,
            debug_mode: options.debug_mode,
            services,
            resolver,
            stage: StagePipeline::new(),
            additional_movie: false,
            show_settings_on_boot: options.show_settings_on_first_boot,
            first_boot: options.first_boot,
            intro_area: options.intro_area,
            intro_episode: options.intro_episode,
            queued_secret_movie: false,
            needs_shutdown: false,
            init_callbacks: CallbackRegistry::new(),
            boot_callbacks: CallbackRegistry::new(),
            change_callbacks: CallbackRegistry::new(),
            events,
        }
    }

    pub fn log(&self) -> &EventLog {
        &self.events
    }

    /// The boot-intro target scene configured at startup.
    pub fn intro_scene(&self) -> SceneDescriptor {
        SceneDescriptor::new(self.intro_area, self.intro_episode, 0)
    }

    pub fn set_intro_stage(&mut self, area: u8, episode: u8) {
        self.intro_area = area;
        self.intro_episode = episode;
    }

    pub fn show_settings_on_first_boot(&mut self, show_on_boot: bool) {
        self.show_settings_on_boot = show_on_boot;
    }

    pub fn is_first_boot(&self) -> bool {
        self.first_boot
    }

    pub fn needs_shutdown(&self) -> bool {
        self.needs_shutdown
    }

    pub fn additional_movie(&self) -> bool {
        self.additional_movie
    }

    /// A pending secret-course cutscene; the stage handler latches this
    /// into the additional-movie flag on entry.
    pub fn queue_secret_movie(&mut self, queued: bool) {
        self.queued_secret_movie = queued;
    }

    pub fn check_additional_movie(&self) -> bool {
        self.queued_secret_movie
    }

    pub fn register_init_callback(&mut self, callback: AppCallback) {
        self.init_callbacks.register(callback);
    }

    pub fn register_boot_callback(&mut self, callback: AppCallback) {
        self.boot_callbacks.register(callback);
    }

    pub fn register_change_callback(&mut self, callback: AppCallback) {
        self.change_callbacks.register(callback);
    }

    // Registries are not mutated during dispatch; the take/restore dance
    // below keeps the borrow checker satisfied while the callbacks receive
    // the whole application. Anything registered mid-fire is preserved.

    pub(crate) fn fire_init_callbacks(&mut self) {
        let mut registry = mem::take(&mut self.init_callbacks);
        for callback in registry.iter_mut() {
            callback(self);
        }
        let added = mem::replace(&mut self.init_callbacks, registry);
        self.init_callbacks.append(added);
    }

    pub(crate) fn fire_boot_callbacks(&mut self) {
        let mut registry = mem::take(&mut self.boot_callbacks);
        for callback in registry.iter_mut() {
            callback(self);
        }
        let added = mem::replace(&mut self.boot_callbacks, registry);
        self.boot_callbacks.append(added);
    }

    pub(crate) fn fire_change_callbacks(&mut self) {
        let mut registry = mem::take(&mut self.change_callbacks);
        for callback in registry.iter_mut() {
            callback(self);
        }
        let added = mem::replace(&mut self.change_callbacks, registry);
        self.change_callbacks.append(added);
    }

    /// Stage-session entry, driven by the stage director's setup: host flag
    /// reset, parameter resolution for the current scene, then the init
    /// pipeline.
    pub fn enter_stage(&mut self, director: &mut dyn Director) {
        self.services.flags.reset_stage_flags();
        let name = self
            .services
            .names
            .stage_name(self.current_scene.area, self.current_scene.episode);
        let params = self.resolver.resolve(name.as_deref());
        self.events.push(format!("stage.enter {}", self.current_scene));
        self.stage.begin_session(params, director);
        self.events.push("stage.ready");
    }

    /// One simulation frame's worth of stage update callbacks.
    pub fn run_update_frame(&mut self) {
        let Some(director) = self.director.as_deref_mut() else {
            return;
        };
        self.stage.run_update(self.context, director);
    }

    /// One render frame's worth of the 2D overlay pass.
    pub fn run_draw_frame(&mut self, surface: &mut dyn DrawSurface) {
        if self.context != AppContext::DirectStage {
            return;
        }
        let Some(director) = self.director.as_deref_mut() else {
            return;
        };
        if director.kind() != DirectorKind::Stage {
            return;
        }
        self.stage.run_draw(director, surface);
    }

    /// Unconditional end-of-activation teardown. Exit callbacks run against
    /// the still-live director when the stage context is being left, then
    /// the slot is dropped and cleared.
    pub(crate) fn teardown_director(&mut self) {
        let Some(mut director) = self.director.take() else {
            return;
        };
        if self.context == AppContext::DirectStage {
            self.events.push("stage.exit");
        }
        self.stage.end_session(self.context, director.as_mut());
        self.events.push(format!("director.destroy {}", director.label()));
    }

    /// Scene-transition bookkeeping. Fires only while the context sits at
    /// or before the level select and the additional-movie flag is clear;
    /// the sentinel episode keeps an uninitialized scene out of `previous`.
    pub fn apply_scene_bookkeeping(&mut self) {
        if self.additional_movie {
            return;
        }
        if !self.context.at_or_before(AppContext::DirectLevelSelect) {
            return;
        }
        if self.next_scene.same_stage_as(&self.current_scene) {
            return;
        }
        if self.current_scene.episode != EPISODE_UNSET {
            self.previous_scene = self.current_scene;
        }
        self.current_scene = self.next_scene;
    }
}

/// Resolution of a controller-reset interrupt: a pure function of the live
/// context, the pending delay context and the media probe, so the
/// cancellation path is testable without hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetResolution {
    pub context: ContextId,
    pub delay: ContextId,
    pub needs_shutdown: bool,
    pub unmount_storage: bool,
}

pub fn resolve_reset(
    context: ContextId,
    delay: ContextId,
    debug_mode: bool,
    media_present: bool,
) -> ResetResolution {
    if !media_present {
        return ResetResolution {
            context,
            delay: AppContext::GameShutdown.into(),
            needs_shutdown: true,
            unmount_storage: false,
        };
    }
    if context == AppContext::GameBoot || context == AppContext::GameBootLogo {
        // A reset this early has nothing to tear down; both the live context
        // and the delay are forced so the loop actually exits.
        return ResetResolution {
            context: AppContext::GameShutdown.into(),
            delay: AppContext::GameShutdown.into(),
            needs_shutdown: false,
            unmount_storage: false,
        };
    }
    if context != AppContext::GameShutdown {
        let delay = if debug_mode {
            AppContext::DirectLevelSelect.into()
        } else {
            AppContext::GameIntro.into()
        };
        return ResetResolution {
            context,
            delay,
            needs_shutdown: false,
            unmount_storage: true,
        };
    }
    ResetResolution {
        context,
        delay,
        needs_shutdown: false,
        unmount_storage: false,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub iterations: u32,
    pub final_context: ContextId,
    pub current_scene: SceneDescriptor,
    pub previous_scene: SceneDescriptor,
    pub next_scene: SceneDescriptor,
    pub needs_shutdown: bool,
    pub events: Vec<String>,
}

/// The top-level state machine: owns the dispatch table, the frame driver
/// and the application state, and runs contexts until shutdown.
pub struct ApplicationLoop {
    dispatch: ContextDispatchTable,
    driver: Box<dyn FrameDriver>,
    pub app: Application,
}

impl ApplicationLoop {
    pub fn new(app: Application, driver: Box<dyn FrameDriver>) -> Self {
        ApplicationLoop {
            dispatch: ContextDispatchTable::new(),
            driver,
            app,
        }
    }

    pub fn dispatch_mut(&mut self) -> &mut ContextDispatchTable {
        &mut self.dispatch
    }

    /// Registers the built-in handlers and runs the startup completeness
    /// check over every dispatchable context.
    pub fn install_default_handlers(&mut self) -> Result<()> {
        handlers::install(&mut self.dispatch)?;
        self.dispatch.ensure_registered(&AppContext::DISPATCHABLE)?;
        Ok(())
    }

    pub fn run(&mut self) -> RunSummary {
        self.app.services.hooks.load_settings();

        let mut delay: ContextId = AppContext::GameBoot.into();
        let mut iterations: u32 = 0;
        loop {
            iterations += 1;

            // The handler may create a director and rewrite the live
            // context and scenes; post-processing below reads the mutated
            // state, not a snapshot.
            let handler = self.dispatch.lookup_mut(self.app.context);
            let skip_frames = handler(&mut self.app);
            if !skip_frames {
                delay = self.driver.run_context(&mut self.app);
                self.app.fire_change_callbacks();
            }

            self.app.teardown_director();

            if self.app.context == AppContext::GameBootLogo {
                if !self.app.services.gamepad.reset_requested() {
                    self.app.services.hooks.post_logo_init();

                    let expected = self.app.intro_scene();
                    let hijacked = !self.app.next_scene.same_stage_as(&expected);

                    if self.app.debug_mode {
                        delay = AppContext::DirectLevelSelect.into();
                    } else if self.app.show_settings_on_boot && self.app.first_boot {
                        delay = AppContext::DirectSettingsMenu.into();
                    }
                    // An external tool hijacking scene selection wins over
                    // both of the above.
                    if hijacked {
                        delay = AppContext::DirectStage.into();
                    }
                }
            } else if self.app.context == AppContext::GameBoot {
                self.app.next_scene = self.app.intro_scene();
                if !self.app.services.gamepad.reset_requested() {
                    self.app.fire_init_callbacks();
                    self.app.services.hooks.boot_init();
                    self.app.fire_boot_callbacks();
                }
            } else {
                self.app.services.heap.free_all();
            }

            self.app.services.rumble.reset();

            if self.app.services.gamepad.reset_requested() {
                self.app.services.gamepad.clear_reset();
                self.app.services.gamepad.recalibrate();

                let media_present = self.app.services.media.is_present();
                let resolution =
                    resolve_reset(self.app.context, delay, self.app.debug_mode, media_present);
                self.app.context = resolution.context;
                delay = resolution.delay;
                if resolution.needs_shutdown {
                    self.app.needs_shutdown = true;
                }
                if resolution.unmount_storage {
                    self.app.services.media.unmount_storage();
                }
            }

            self.app
                .log()
                .push(format!("context.step {} -> {}", self.app.context, delay));

            self.app.apply_scene_bookkeeping();

            self.app.context = delay;
            if self.app.context == AppContext::GameShutdown {
                break;
            }
        }

        RunSummary {
            iterations,
            final_context: self.app.context,
            current_scene: self.app.current_scene,
            previous_scene: self.app.previous_scene,
            next_scene: self.app.next_scene,
            needs_shutdown: self.app.needs_shutdown,
            events: self.app.log().snapshot(),
        }
    }
}
