use std::path::PathBuf;

use clap::Parser;

/// Headless harness that drives the stage-sequencing runtime through a
/// scripted session and records the collaborator traffic.
#[derive(Parser, Debug)]
#[command(
    about = "Headless harness for the stage-sequencing runtime",
    version
)]
pub struct Args {
    /// Root directory holding data/scene/params
    #[arg(long, default_value = "data-root")]
    pub data_root: PathBuf,

    /// Scenario manifest JSON (defaults to the builtin retail table)
    #[arg(long)]
    pub scenario_manifest: Option<PathBuf>,

    /// Session script JSON driving the frame loop (defaults to the canned
    /// boot-to-shutdown demo)
    #[arg(long)]
    pub script: Option<PathBuf>,

    /// Route the post-logo flow into the level select
    #[arg(long)]
    pub debug_mode: bool,

    /// Show the settings menu after the logo on a first boot
    #[arg(long)]
    pub show_settings_on_first_boot: bool,

    /// Treat this run as the save file's first boot
    #[arg(long)]
    pub first_boot: bool,

    /// Boot-intro target area
    #[arg(long, default_value_t = sun_formats::areas::OPTION)]
    pub intro_area: u8,

    /// Boot-intro target episode
    #[arg(long, default_value_t = 0)]
    pub intro_episode: u8,

    /// Path to write the ordered event log as JSON
    #[arg(long)]
    pub event_log_json: Option<PathBuf>,

    /// Path to write the run summary as JSON
    #[arg(long)]
    pub report_json: Option<PathBuf>,

    /// Echo events to stderr as they are recorded
    #[arg(long)]
    pub verbose: bool,
}
