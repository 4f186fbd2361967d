use crate::application::Application;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectorKind {
    Logo,
    Movie,
    Stage,
    ShineSelect,
    LevelSelect,
    Settings,
}

/// The context-specific controller owned by the application loop.
///
/// Exactly one director is alive at a time; the loop destroys it
/// unconditionally after every context activation, so a director never
/// observes state from a previous activation.
pub trait Director {
    fn kind(&self) -> DirectorKind;
    fn label(&self) -> &'static str;

    /// Stage-object construction point; fires after init callbacks.
    fn setup_objects(&mut self) {}
}

pub struct LogoDirector;

impl LogoDirector {
    pub fn new() -> Self {
        LogoDirector
    }

    pub fn setup(&mut self, app: &mut Application) {
        app.log().push("director.setup logo");
    }
}

impl Default for LogoDirector {
    fn default() -> Self {
        Self::new()
    }
}

impl Director for LogoDirector {
    fn kind(&self) -> DirectorKind {
        DirectorKind::Logo
    }

    fn label(&self) -> &'static str {
        "logo"
    }
}

pub struct MovieDirector {
    pub cut_scene_id: u8,
}

impl MovieDirector {
    pub fn new(cut_scene_id: u8) -> Self {
        MovieDirector { cut_scene_id }
    }

    pub fn setup(&mut self, app: &mut Application) {
        app.log()
            .push(format!("director.setup movie {}", self.cut_scene_id));
    }
}

impl Director for MovieDirector {
    fn kind(&self) -> DirectorKind {
        DirectorKind::Movie
    }

    fn label(&self) -> &'static str {
        "movie"
    }
}

/// Outcome of stage-director setup. Resource failure skips the frame loop
/// and retreats to the intro instead of crashing mid-load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageSetup {
    Run,
    SkipToIntro,
}

pub struct StageDirector {
    pub area: u8,
    pub episode: u8,
    objects_ready: bool,
}

impl StageDirector {
    pub fn new(area: u8, episode: u8) -> Self {
        StageDirector {
            area,
            episode,
            objects_ready: false,
        }
    }

    pub fn objects_ready(&self) -> bool {
        self.objects_ready
    }

    /// Loads the stage session: flag reset, parameter resolution, init
    /// callbacks, object construction. Reports `SkipToIntro` when the
    /// scenario table has no archive for the requested scene.
    pub fn setup(&mut self, app: &mut Application) -> StageSetup {
        app.log().push("director.setup stage");
        let name = app
            .services
            .names
            .stage_name(self.area, self.episode);
        let Some(name) = name else {
            app.log()
                .push(format!("stage.missing {}:{}", self.area, self.episode));
            return StageSetup::SkipToIntro;
        };

        app.log().push(format!("stage.load {name}"));
        app.enter_stage(self);
        StageSetup::Run
    }
}

impl Director for StageDirector {
    fn kind(&self) -> DirectorKind {
        DirectorKind::Stage
    }

    fn label(&self) -> &'static str {
        "stage"
    }

    fn setup_objects(&mut self) {
        self.objects_ready = true;
    }
}

pub struct SelectDirector {
    pub area: u8,
}

impl SelectDirector {
    pub fn new(area: u8) -> Self {
        SelectDirector { area }
    }

    pub fn setup(&mut self, app: &mut Application) {
        app.log()
            .push(format!("director.setup shine_select {}", self.area));
    }
}

impl Director for SelectDirector {
    fn kind(&self) -> DirectorKind {
        DirectorKind::ShineSelect
    }

    fn label(&self) -> &'static str {
        "shine_select"
    }
}

pub struct LevelSelectDirector;

impl LevelSelectDirector {
    pub fn new() -> Self {
        LevelSelectDirector
    }

    pub fn setup(&mut self, app: &mut Application) {
        app.log().push("director.setup level_select");
    }
}

impl Default for LevelSelectDirector {
    fn default() -> Self {
        Self::new()
    }
}

impl Director for LevelSelectDirector {
    fn kind(&self) -> DirectorKind {
        DirectorKind::LevelSelect
    }

    fn label(&self) -> &'static str {
        "level_select"
    }
}

pub struct SettingsDirector;

impl SettingsDirector {
    pub fn new() -> Self {
        SettingsDirector
    }

    pub fn setup(&mut self, app: &mut Application) {
        app.log().push("director.setup settings");
    }
}

impl Default for SettingsDirector {
    fn default() -> Self {
        Self::new()
    }
}

impl Director for SettingsDirector {
    fn kind(&self) -> DirectorKind {
        DirectorKind::Settings
    }

    fn label(&self) -> &'static str {
        "settings"
    }
}
