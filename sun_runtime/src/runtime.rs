use std::fs;

use anyhow::{Context, Result};
use sun_formats::ScenarioTable;

use crate::application::{AppOptions, Application, ApplicationLoop, RunSummary};
use crate::cli::Args;
use crate::params::StageParamsResolver;
use crate::script::{ScriptedDriver, SessionScript};
use crate::services::{recording_services, EventLog, StageNames};

pub fn execute(args: Args) -> Result<()> {
    let log = EventLog::new(args.verbose);

    let names: Box<dyn StageNames> = match args.scenario_manifest.as_ref() {
        Some(path) => Box::new(ScenarioTable::from_json_file(path)?),
        None => Box::new(ScenarioTable::builtin()),
    };

    let script = match args.script.as_ref() {
        Some(path) => SessionScript::from_json_file(path)?,
        None => SessionScript::canned(),
    };

    let recording = recording_services(&log, names);
    let resolver = StageParamsResolver::new(&args.data_root, log.clone());
    let options = AppOptions {
        debug_mode: args.debug_mode,
        show_settings_on_first_boot: args.show_settings_on_first_boot,
        first_boot: args.first_boot,
        intro_area: args.intro_area,
        intro_episode: args.intro_episode,
    };
    let app = Application::new(options, recording.services, resolver, log.clone());

    let driver = ScriptedDriver::new(
        script,
        recording.reset_flag,
        recording.media_present,
        log.clone(),
    );

    let mut app_loop = ApplicationLoop::new(app, Box::new(driver));
    app_loop.install_default_handlers()?;
    let summary = app_loop.run();

    if let Some(path) = args.event_log_json.as_ref() {
        let json = serde_json::to_string_pretty(&summary.events)
            .context("serializing event log to JSON")?;
        fs::write(path, &json)
            .with_context(|| format!("writing event log to {}", path.display()))?;
        println!("Saved event log to {}", path.display());
    }

    if let Some(path) = args.report_json.as_ref() {
        let json =
            serde_json::to_string_pretty(&summary).context("serializing run summary to JSON")?;
        fs::write(path, &json)
            .with_context(|| format!("writing run summary to {}", path.display()))?;
        println!("Saved run summary to {}", path.display());
    }

    report(&summary);
    Ok(())
}

fn report(summary: &RunSummary) {
    println!(
        "run complete: {} context activations, final context {}, scene {} (previous {})",
        summary.iterations, summary.final_context, summary.current_scene, summary.previous_scene
    );
    if summary.needs_shutdown {
        println!("media was missing; the run was forced toward shutdown");
    }
}
