use anyhow::{ensure, Result};

use crate::application::Application;
use crate::context::{AppContext, ContextDispatchTable, ContextHandler};
use crate::director::{
    LevelSelectDirector, LogoDirector, MovieDirector, SelectDirector, SettingsDirector,
    StageDirector, StageSetup,
};
use crate::services::RenderMode;

/// Progress flag poked when the level select comes up.
const LEVEL_SELECT_FLAG: u32 = 0x20001;

/// Registers the built-in handler set. Shutdown gets no handler: the loop
/// exits before ever dispatching it.
pub fn install(table: &mut ContextDispatchTable) -> Result<()> {
    let handlers: Vec<(AppContext, ContextHandler)> = vec![
        (AppContext::GameBoot, Box::new(handle_game_boot)),
        (AppContext::GameBootLogo, Box::new(handle_game_boot_logo)),
        (AppContext::GameIntro, Box::new(handle_game_intro)),
        (AppContext::DirectStage, Box::new(handle_direct_stage)),
        (AppContext::DirectMovie, Box::new(handle_direct_movie)),
        (
            AppContext::DirectShineSelect,
            Box::new(handle_direct_shine_select),
        ),
        (
            AppContext::DirectLevelSelect,
            Box::new(handle_direct_level_select),
        ),
        (
            AppContext::DirectSettingsMenu,
            Box::new(handle_direct_settings_menu),
        ),
    ];
    for (context, handler) in handlers {
        ensure!(
            table.register(context, handler),
            "context {context:?} already has a handler"
        );
    }
    Ok(())
}

fn handle_game_boot(app: &mut Application) -> bool {
    app.services.display.apply_render_mode(RenderMode::Logo);
    false
}

fn handle_game_boot_logo(app: &mut Application) -> bool {
    app.services.display.apply_render_mode(RenderMode::Logo);

    let mut director = LogoDirector::new();
    director.setup(app);
    app.director = Some(Box::new(director));
    false
}

fn movie_body(app: &mut Application) {
    app.services.display.apply_render_mode(RenderMode::Movie);

    let (width, height) = app.services.display.render_size(RenderMode::Movie);
    app.services.display.resize_fader(width, height);

    let mut director = MovieDirector::new(app.cut_scene_id);
    director.setup(app);
    app.director = Some(Box::new(director));
}

fn handle_direct_movie(app: &mut Application) -> bool {
    movie_body(app);
    false
}

fn handle_game_intro(app: &mut Application) -> bool {
    app.cut_scene_id = 9;
    app.next_scene = app.intro_scene();
    movie_body(app);
    false
}

fn handle_direct_stage(app: &mut Application) -> bool {
    app.additional_movie = app.check_additional_movie();
    if app.additional_movie {
        // A secret-course cutscene plays under the stage context; the
        // scene descriptors must survive it untouched.
        movie_body(app);
        return false;
    }

    app.services.display.apply_render_mode(RenderMode::Game);
    let (width, height) = app.services.display.render_size(RenderMode::Game);
    app.services.display.resize_fader(width, height);

    let mut director = StageDirector::new(app.current_scene.area, app.current_scene.episode);
    let disposition = director.setup(app);
    app.director = Some(Box::new(director));

    match disposition {
        StageSetup::Run => false,
        StageSetup::SkipToIntro => {
            app.context = AppContext::GameIntro.into();
            true
        }
    }
}

fn handle_direct_shine_select(app: &mut Application) -> bool {
    app.services.display.apply_render_mode(RenderMode::Title);
    app.additional_movie = false;

    let (width, height) = app.services.display.render_size(RenderMode::Title);
    app.services.display.resize_fader(width, height);

    let mut director = SelectDirector::new(app.current_scene.area);
    director.setup(app);
    app.director = Some(Box::new(director));
    false
}

fn handle_direct_level_select(app: &mut Application) -> bool {
    app.services.display.apply_render_mode(RenderMode::Title);
    app.additional_movie = false;

    let (width, height) = app.services.display.render_size(RenderMode::Title);
    app.services.display.resize_fader(width, height);

    let mut director = LevelSelectDirector::new();
    director.setup(app);
    app.director = Some(Box::new(director));

    app.services.flags.set_flag(LEVEL_SELECT_FLAG, 3);

    let intro = app.intro_scene();
    app.current_scene = intro;
    app.next_scene = intro;
    false
}

fn handle_direct_settings_menu(app: &mut Application) -> bool {
    app.services.display.apply_render_mode(RenderMode::Title);
    app.additional_movie = false;

    let (width, height) = app.services.display.render_size(RenderMode::Title);
    app.services.display.resize_fader(width, height);

    let mut director = SettingsDirector::new();
    director.setup(app);
    app.director = Some(Box::new(director));

    let intro = app.intro_scene();
    app.current_scene = intro;
    app.next_scene = intro;
    false
}

#[cfg(test)]
mod tests {
    use sun_formats::ScenarioTable;

    use super::*;
    use crate::application::{AppOptions, Application};
    use crate::director::DirectorKind;
    use crate::params::StageParamsResolver;
    use crate::scene::SceneDescriptor;
    use crate::services::{recording_services, EventLog};

    fn test_app() -> Application {
        let log = EventLog::new(false);
        let recording = recording_services(&log, Box::new(ScenarioTable::builtin()));
        let resolver = StageParamsResolver::new("/nonexistent", log.clone());
        Application::new(AppOptions::default(), recording.services, resolver, log)
    }

    #[test]
    fn install_covers_every_dispatchable_context() {
        let mut table = ContextDispatchTable::new();
        install(&mut table).unwrap();
        assert!(table.ensure_registered(&AppContext::DISPATCHABLE).is_ok());
    }

    #[test]
    fn installing_twice_fails() {
        let mut table = ContextDispatchTable::new();
        install(&mut table).unwrap();
        assert!(install(&mut table).is_err());
    }

    #[test]
    fn stage_handler_builds_a_stage_director_and_enters_the_stage() {
        let mut app = test_app();
        app.context = AppContext::DirectStage.into();
        app.current_scene = SceneDescriptor::new(1, 0, 0);

        let skip = handle_direct_stage(&mut app);

        assert!(!skip);
        let director = app.director.as_ref().unwrap();
        assert_eq!(director.kind(), DirectorKind::Stage);
        assert!(app.stage.is_initialized());
    }

    #[test]
    fn stage_handler_skips_to_intro_when_the_scene_is_unknown() {
        let mut app = test_app();
        app.context = AppContext::DirectStage.into();
        app.current_scene = SceneDescriptor::new(200, 0, 0);

        let skip = handle_direct_stage(&mut app);

        assert!(skip);
        assert_eq!(app.context, AppContext::GameIntro);
        // The failed director still lands in the slot; the loop destroys it
        // unconditionally either way.
        assert!(app.director.is_some());
        assert!(!app.stage.is_initialized());
    }

    #[test]
    fn stage_handler_plays_a_queued_secret_movie_instead() {
        let mut app = test_app();
        app.context = AppContext::DirectStage.into();
        app.current_scene = SceneDescriptor::new(1, 0, 0);
        app.queue_secret_movie(true);

        let skip = handle_direct_stage(&mut app);

        assert!(!skip);
        assert!(app.additional_movie());
        assert_eq!(app.director.as_ref().unwrap().kind(), DirectorKind::Movie);
        assert!(!app.stage.is_initialized());
    }

    #[test]
    fn intro_handler_targets_the_configured_intro_scene() {
        let mut app = test_app();
        app.context = AppContext::GameIntro.into();

        handle_game_intro(&mut app);

        assert_eq!(app.cut_scene_id, 9);
        assert_eq!(app.next_scene, app.intro_scene());
        assert_eq!(app.director.as_ref().unwrap().kind(), DirectorKind::Movie);
    }

    #[test]
    fn level_select_handler_pins_scenes_to_the_intro_stage() {
        let mut app = test_app();
        app.context = AppContext::DirectLevelSelect.into();
        app.current_scene = SceneDescriptor::new(1, 2, 0);
        app.additional_movie = true;

        handle_direct_level_select(&mut app);

        assert!(!app.additional_movie());
        assert_eq!(app.current_scene, app.intro_scene());
        assert_eq!(app.next_scene, app.intro_scene());
        assert!(app
            .log()
            .snapshot()
            .iter()
            .any(|e| e == "flags.set 0x20001 3"));
    }
}
