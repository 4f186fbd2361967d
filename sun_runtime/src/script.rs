use std::cell::Cell;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::application::Application;
use crate::context::{AppContext, ContextId};
use crate::scene::SceneDescriptor;
use crate::services::{EventLog, FrameDriver, RecordingSurface};

/// One scripted context activation: what the external game loop does while
/// a context is live, and which context it hands back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptedActivation {
    /// Simulation/render frames to run before returning.
    #[serde(default)]
    pub frames: u32,
    /// Scene selection performed by the frame body (or an external tool).
    #[serde(default)]
    pub next_scene: Option<SceneDescriptor>,
    /// The delay context handed back to the loop.
    pub delay_context: ContextId,
    /// Press the reset combo on the primary controller.
    #[serde(default)]
    pub press_reset: bool,
    /// Flip media presence before the loop's next probe.
    #[serde(default)]
    pub media_present: Option<bool>,
    /// Queue a secret-course cutscene for the next stage entry.
    #[serde(default)]
    pub queue_secret_movie: bool,
}

impl ScriptedActivation {
    pub fn delay_to(context: AppContext) -> Self {
        ScriptedActivation {
            frames: 0,
            next_scene: None,
            delay_context: context.into(),
            press_reset: false,
            media_present: None,
            queue_secret_movie: false,
        }
    }
}

/// A whole scripted session, loadable from JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionScript {
    pub activations: Vec<ScriptedActivation>,
}

impl SessionScript {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading session script from {}", path.display()))?;
        let script: SessionScript = serde_json::from_str(&data)
            .with_context(|| format!("parsing session script from {}", path.display()))?;
        Ok(script)
    }

    /// The default demo session: boot, logo, intro, one stage episode, a
    /// shine select, shutdown.
    pub fn canned() -> Self {
        let mut stage = ScriptedActivation::delay_to(AppContext::DirectShineSelect);
        stage.frames = 4;

        let mut intro = ScriptedActivation::delay_to(AppContext::DirectStage);
        intro.next_scene = Some(SceneDescriptor::new(sun_formats::areas::DOLPIC, 0, 0));

        SessionScript {
            activations: vec![
                ScriptedActivation::delay_to(AppContext::GameBootLogo),
                ScriptedActivation::delay_to(AppContext::GameIntro),
                intro,
                stage,
                ScriptedActivation::delay_to(AppContext::GameShutdown),
            ],
        }
    }
}

/// Frame driver that replays a `SessionScript`: the harness stand-in for
/// the host engine's game loop. An exhausted script forces shutdown so a
/// run always terminates.
pub struct ScriptedDriver {
    queue: VecDeque<ScriptedActivation>,
    reset_flag: Rc<Cell<bool>>,
    media_present: Rc<Cell<bool>>,
    surface: RecordingSurface,
    log: EventLog,
}

impl ScriptedDriver {
    pub fn new(
        script: SessionScript,
        reset_flag: Rc<Cell<bool>>,
        media_present: Rc<Cell<bool>>,
        log: EventLog,
    ) -> Self {
        ScriptedDriver {
            queue: script.activations.into(),
            surface: RecordingSurface::new(log.clone()),
            reset_flag,
            media_present,
            log,
        }
    }
}

impl FrameDriver for ScriptedDriver {
    fn run_context(&mut self, app: &mut Application) -> ContextId {
        let Some(step) = self.queue.pop_front() else {
            self.log.push("driver.exhausted");
            return AppContext::GameShutdown.into();
        };

        for _ in 0..step.frames {
            app.run_update_frame();
            app.run_draw_frame(&mut self.surface);
        }

        if let Some(scene) = step.next_scene {
            app.next_scene = scene;
        }
        if let Some(present) = step.media_present {
            self.media_present.set(present);
        }
        if step.press_reset {
            self.reset_flag.set(true);
        }
        app.queue_secret_movie(step.queue_secret_movie);

        step.delay_context
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn canned_script_ends_in_shutdown() {
        let script = SessionScript::canned();
        let last = script.activations.last().unwrap();
        assert_eq!(last.delay_context, AppContext::GameShutdown.id());
    }

    #[test]
    fn scripts_round_trip_through_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let json = serde_json::to_string_pretty(&SessionScript::canned()).unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let script = SessionScript::from_json_file(file.path()).unwrap();
        assert_eq!(script.activations.len(), 5);
        assert_eq!(
            script.activations[2].next_scene,
            Some(SceneDescriptor::new(sun_formats::areas::DOLPIC, 0, 0))
        );
    }

    #[test]
    fn sparse_script_entries_fill_with_defaults() {
        let json = r#"{"activations":[{"delay_context":9}]}"#;
        let script: SessionScript = serde_json::from_str(json).unwrap();
        let step = &script.activations[0];
        assert_eq!(step.frames, 0);
        assert_eq!(step.next_scene, None);
        assert!(!step.press_reset);
        assert_eq!(step.delay_context, AppContext::GameShutdown.id());
    }
}
