use std::cell::{Cell, RefCell};
use std::rc::Rc;

use sun_formats::ScenarioTable;

use crate::application::Application;
use crate::context::ContextId;

/// Ordered run transcript shared between the loop, the collaborator stubs
/// and the harness. Single-threaded by design; clones share the same
/// underlying log.
#[derive(Clone, Default)]
pub struct EventLog {
    entries: Rc<RefCell<Vec<String>>>,
    verbose: bool,
}

impl EventLog {
    pub fn new(verbose: bool) -> Self {
        EventLog {
            entries: Rc::default(),
            verbose,
        }
    }

    pub fn push(&self, event: impl Into<String>) {
        let event = event.into();
        if self.verbose {
            eprintln!("[sun_runtime] {event}");
        }
        self.entries.borrow_mut().push(event);
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Logo,
    Movie,
    Game,
    Title,
}

impl RenderMode {
    pub fn token(self) -> &'static str {
        match self {
            RenderMode::Logo => "logo",
            RenderMode::Movie => "movie",
            RenderMode::Game => "game",
            RenderMode::Title => "title",
        }
    }
}

/// Bulk allocator backing one context activation's transient allocations.
pub trait FrameHeap {
    fn free_all(&mut self);
}

pub trait RumbleMotor {
    fn reset(&mut self);
}

/// The primary controller. The reset flag is level-triggered: the loop
/// observes it, acts, then clears it once per iteration.
pub trait GamePad {
    fn reset_requested(&self) -> bool;
    fn clear_reset(&mut self);
    fn recalibrate(&mut self);
}

pub trait MediaDrive {
    fn is_present(&self) -> bool;
    fn unmount_storage(&mut self);
}

/// Host progress/stage flag storage.
pub trait FlagBoard {
    fn reset_stage_flags(&mut self);
    fn set_flag(&mut self, key: u32, value: u32);
}

pub trait DisplayHost {
    fn apply_render_mode(&mut self, mode: RenderMode);
    fn render_size(&self, mode: RenderMode) -> (u16, u16);
    fn resize_fader(&mut self, width: u16, height: u16);
}

/// Host-side one-shot initialization hooks consumed by the loop.
pub trait BootHooks {
    fn load_settings(&mut self);
    fn boot_init(&mut self);
    fn post_logo_init(&mut self);
}

/// Scenario naming table: (area, episode) to stage archive name.
pub trait StageNames {
    fn stage_name(&self, area: u8, episode: u8) -> Option<String>;
}

impl StageNames for ScenarioTable {
    fn stage_name(&self, area: u8, episode: u8) -> Option<String> {
        ScenarioTable::stage_name(self, area, episode).map(str::to_string)
    }
}

/// The 2D overlay pass handed to draw callbacks.
pub trait DrawSurface {
    fn setup_2d(&mut self);
}

/// The external per-frame body: one call runs a whole context activation's
/// frames and returns the tentative next context (the "delay context").
pub trait FrameDriver {
    fn run_context(&mut self, app: &mut Application) -> ContextId;
}

/// Every collaborator the loop consumes, behind one owned seam.
pub struct HostServices {
    pub heap: Box<dyn FrameHeap>,
    pub rumble: Box<dyn RumbleMotor>,
    pub gamepad: Box<dyn GamePad>,
    pub media: Box<dyn MediaDrive>,
    pub flags: Box<dyn FlagBoard>,
    pub display: Box<dyn DisplayHost>,
    pub hooks: Box<dyn BootHooks>,
    pub names: Box<dyn StageNames>,
}

// Recording implementations. The harness and the tests observe collaborator
// traffic through the shared event log instead of real hardware.

struct RecordingHeap {
    log: EventLog,
}

impl FrameHeap for RecordingHeap {
    fn free_all(&mut self) {
        self.log.push("heap.free_all");
    }
}

struct RecordingRumble {
    log: EventLog,
}

impl RumbleMotor for RecordingRumble {
    fn reset(&mut self) {
        self.log.push("rumble.reset");
    }
}

struct ScriptedGamePad {
    log: EventLog,
    reset: Rc<Cell<bool>>,
}

impl GamePad for ScriptedGamePad {
    fn reset_requested(&self) -> bool {
        self.reset.get()
    }

    fn clear_reset(&mut self) {
        self.reset.set(false);
        self.log.push("gamepad.clear_reset");
    }

    fn recalibrate(&mut self) {
        self.log.push("gamepad.recalibrate");
    }
}

struct ScriptedMedia {
    log: EventLog,
    present: Rc<Cell<bool>>,
}

impl MediaDrive for ScriptedMedia {
    fn is_present(&self) -> bool {
        self.present.get()
    }

    fn unmount_storage(&mut self) {
        self.log.push("media.unmount");
    }
}

struct RecordingFlags {
    log: EventLog,
}

impl FlagBoard for RecordingFlags {
    fn reset_stage_flags(&mut self) {
        self.log.push("flags.reset_stage");
    }

    fn set_flag(&mut self, key: u32, value: u32) {
        self.log.push(format!("flags.set {key:#x} {value}"));
    }
}

struct RecordingDisplay {
    log: EventLog,
}

impl DisplayHost for RecordingDisplay {
    fn apply_render_mode(&mut self, mode: RenderMode) {
        self.log.push(format!("display.mode {}", mode.token()));
    }

    fn render_size(&self, mode: RenderMode) -> (u16, u16) {
        match mode {
            RenderMode::Logo | RenderMode::Movie => (640, 480),
            RenderMode::Game => (608, 448),
            RenderMode::Title => (640, 480),
        }
    }

    fn resize_fader(&mut self, width: u16, height: u16) {
        self.log.push(format!("fader.resize {width}x{height}"));
    }
}

struct RecordingHooks {
    log: EventLog,
}

impl BootHooks for RecordingHooks {
    fn load_settings(&mut self) {
        self.log.push("hooks.load_settings");
    }

    fn boot_init(&mut self) {
        self.log.push("hooks.boot_init");
    }

    fn post_logo_init(&mut self) {
        self.log.push("hooks.post_logo_init");
    }
}

pub struct RecordingSurface {
    log: EventLog,
}

impl RecordingSurface {
    pub fn new(log: EventLog) -> Self {
        RecordingSurface { log }
    }
}

impl DrawSurface for RecordingSurface {
    fn setup_2d(&mut self) {
        self.log.push("draw.setup_2d");
    }
}

/// Recording collaborator set plus the toggles a script can flip mid-run.
pub struct RecordingServices {
    pub services: HostServices,
    pub reset_flag: Rc<Cell<bool>>,
    pub media_present: Rc<Cell<bool>>,
}

pub fn recording_services(log: &EventLog, names: Box<dyn StageNames>) -> RecordingServices {
    let reset_flag = Rc::new(Cell::new(false));
    let media_present = Rc::new(Cell::new(true));
    let services = HostServices {
        heap: Box::new(RecordingHeap { log: log.clone() }),
        rumble: Box::new(RecordingRumble { log: log.clone() }),
        gamepad: Box::new(ScriptedGamePad {
            log: log.clone(),
            reset: reset_flag.clone(),
        }),
        media: Box::new(ScriptedMedia {
            log: log.clone(),
            present: media_present.clone(),
        }),
        flags: Box::new(RecordingFlags { log: log.clone() }),
        display: Box::new(RecordingDisplay { log: log.clone() }),
        hooks: Box::new(RecordingHooks { log: log.clone() }),
        names,
    };
    RecordingServices {
        services,
        reset_flag,
        media_present,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_log_clones_share_one_transcript() {
        let log = EventLog::new(false);
        let clone = log.clone();
        log.push("first");
        clone.push("second");
        assert_eq!(log.snapshot(), vec!["first", "second"]);
    }

    #[test]
    fn scripted_gamepad_reset_is_level_triggered() {
        let log = EventLog::new(false);
        let recording = recording_services(&log, Box::new(ScenarioTable::builtin()));
        let mut services = recording.services;

        assert!(!services.gamepad.reset_requested());
        recording.reset_flag.set(true);
        assert!(services.gamepad.reset_requested());
        services.gamepad.clear_reset();
        assert!(!services.gamepad.reset_requested());
    }
}
