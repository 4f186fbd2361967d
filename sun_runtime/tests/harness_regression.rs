use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use serde::Deserialize;
use tempfile::tempdir;

#[derive(Debug, Deserialize)]
struct Summary {
    iterations: u32,
    final_context: u8,
    needs_shutdown: bool,
    events: Vec<String>,
}

#[test]
fn canned_harness_run_produces_stable_artifacts() -> Result<()> {
    let temp_dir = tempdir().context("creating temporary directory for harness artifacts")?;
    let event_log_path = temp_dir.path().join("events.json");
    let report_path = temp_dir.path().join("report.json");

    let event_log_str = event_log_path
        .to_str()
        .context("event log path is not valid UTF-8")?;
    let report_str = report_path
        .to_str()
        .context("report path is not valid UTF-8")?;

    let output = Command::new(env!("CARGO_BIN_EXE_sun_runtime"))
        .args([
            "--data-root",
            temp_dir.path().to_str().unwrap(),
            "--event-log-json",
            event_log_str,
            "--report-json",
            report_str,
        ])
        .output()
        .context("executing the sun_runtime harness")?;

    assert!(
        output.status.success(),
        "sun_runtime exited with {:?}: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(event_log_path.is_file(), "harness did not write an event log");
    assert!(report_path.is_file(), "harness did not write a run summary");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("run complete: 5 context activations"),
        "unexpected stdout: {stdout}"
    );

    let events = read_events(&event_log_path)?;
    assert!(events.iter().any(|e| e == "stage.load dolpic0"));
    assert!(events.iter().any(|e| e == "context.step 6 -> 9"));

    let summary = read_summary(&report_path)?;
    assert_eq!(summary.iterations, 5);
    assert_eq!(summary.final_context, 9);
    assert!(!summary.needs_shutdown);
    assert_eq!(summary.events, events);

    Ok(())
}

#[test]
fn harness_accepts_a_session_script_and_manifest() -> Result<()> {
    let temp_dir = tempdir().context("creating temporary directory for harness inputs")?;

    let script_path = temp_dir.path().join("script.json");
    fs::write(
        &script_path,
        r#"{"activations":[{"delay_context":2},{"delay_context":9}]}"#,
    )
    .context("writing session script")?;

    let manifest_path = temp_dir.path().join("scenario.json");
    fs::write(
        &manifest_path,
        r#"{"areas":[{"name":"airport","episodes":["airport0"]}]}"#,
    )
    .context("writing scenario manifest")?;

    let report_path = temp_dir.path().join("report.json");
    let output = Command::new(env!("CARGO_BIN_EXE_sun_runtime"))
        .args([
            "--script",
            script_path.to_str().unwrap(),
            "--scenario-manifest",
            manifest_path.to_str().unwrap(),
            "--report-json",
            report_path.to_str().unwrap(),
        ])
        .output()
        .context("executing the sun_runtime harness with a script")?;

    assert!(
        output.status.success(),
        "sun_runtime exited with {:?}: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );

    let summary = read_summary(&report_path)?;
    assert_eq!(summary.final_context, 9);
    assert_eq!(summary.iterations, 2);

    Ok(())
}

fn read_events(path: &Path) -> Result<Vec<String>> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading event log from {}", path.display()))?;
    let events: Vec<String> = serde_json::from_str(&data)
        .with_context(|| format!("parsing event log from {}", path.display()))?;
    Ok(events)
}

fn read_summary(path: &Path) -> Result<Summary> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading run summary from {}", path.display()))?;
    let summary: Summary = serde_json::from_str(&data)
        .with_context(|| format!("parsing run summary from {}", path.display()))?;
    Ok(summary)
}
