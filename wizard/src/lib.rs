// Install wizard
// Main library entry point

pub mod config;
pub mod navigation;
pub mod spec;
pub mod steps;
pub mod tui;
pub mod utils;
pub mod wizard;

pub use config::WizardSettings;
pub use spec::WizardSpec;
pub use wizard::{Advance, Wizard};

use anyhow::{Context, Result};
use log::{error, info};
use navigation::StepContext;
use std::path::{Path, PathBuf};

/// Initialize logging system with dual format (JSON + human-readable)
fn init_logging(log_dir: Option<&Path>, with_stdout: bool) -> Result<PathBuf> {
    let log_dir = utils::path_resolver::resolve_log_folder(log_dir)?;

    let timestamp = chrono::Utc::now().format("%Y-%m-%d-%H%M%S");

    // JSON log file for structured parsing
    let json_log_file = log_dir.join(format!("wizard-{}.log", timestamp));

    // Human-readable log file (.txt)
    let txt_log_file = log_dir.join(format!("wizard-{}.txt", timestamp));

    // Configure dual-format logging:
    // - JSON format to .log file
    // - Human-readable format to .txt file
    // - Optional: human-readable to stdout (disabled for TUI to avoid corrupting the terminal UI)
    let mut dispatch = fern::Dispatch::new().level(log::LevelFilter::Debug);

    if with_stdout {
        dispatch = dispatch.chain(
            fern::Dispatch::new()
                .format(|out, message, record| {
                    let timestamp_local = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
                    let message_str = format!("{}", message);
                    let (phase, step, cleaned_message) =
                        utils::logging::parse_log_metadata(&message_str);
                    let txt_line = utils::logging::format_human_readable_log(
                        &timestamp_local.to_string(),
                        record.level(),
                        record.target(),
                        &cleaned_message,
                        phase.as_deref(),
                        step.as_deref(),
                    );
                    out.finish(format_args!("{}", txt_line));
                })
                .chain(std::io::stdout()),
        );
    }

    dispatch = dispatch
        .chain(
            fern::Dispatch::new()
                .format(|out, message, record| {
                    let timestamp_utc = chrono::Utc::now().to_rfc3339();
                    let message_str = format!("{}", message);
                    let (phase, step, cleaned_message) =
                        utils::logging::parse_log_metadata(&message_str);
                    let json_line = utils::logging::format_json_log(
                        &timestamp_utc,
                        record.level(),
                        record.target(),
                        &cleaned_message,
                        phase.as_deref(),
                        step.as_deref(),
                    );
                    out.finish(format_args!("{}", json_line));
                })
                .chain(fern::log_file(&json_log_file)?),
        )
        .chain(
            fern::Dispatch::new()
                .format(|out, message, record| {
                    let timestamp_local = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
                    let message_str = format!("{}", message);
                    let (phase, step, cleaned_message) =
                        utils::logging::parse_log_metadata(&message_str);
                    let txt_line = utils::logging::format_human_readable_log(
                        &timestamp_local.to_string(),
                        record.level(),
                        record.target(),
                        &cleaned_message,
                        phase.as_deref(),
                        step.as_deref(),
                    );
                    out.finish(format_args!("{}", txt_line));
                })
                .chain(fern::log_file(&txt_log_file)?),
        );

    dispatch.apply()?;

    info!(
        "[PHASE: initialization] Logging initialized, log directory: {:?}",
        log_dir
    );
    Ok(log_dir)
}

fn start_logging(settings: &WizardSettings, with_stdout: bool) {
    if let Err(e) = init_logging(settings.log_dir.as_deref(), with_stdout) {
        eprintln!("Failed to initialize logging: {:#}", e);
    }
    info!(
        "[PHASE: initialization] Wizard starting at {} (deployment folder {:?})",
        chrono::Utc::now(),
        utils::path_resolver::resolve_deployment_folder()
    );
}

/// Compile the configured spec and create a wizard seeded from the settings.
pub fn build_wizard(settings: &WizardSettings) -> Result<Wizard> {
    let spec = settings.load_spec()?;
    let registry = steps::builtin_registry();
    let context = StepContext::new(settings.seed_properties());
    info!(
        "[PHASE: initialization] [STEP: build] Session {} with {} initial properties",
        context.session_id(),
        context.properties.len()
    );
    Wizard::from_spec(&spec, &registry, context).context("Failed to build wizard")
}

/// Interactive terminal wizard.
///
/// Exit code 1 on errors, 2 when the user cancelled.
pub fn run_tui(settings: &WizardSettings) {
    // No stdout logging while the terminal UI is active
    start_logging(settings, false);

    let outcome = build_wizard(settings).and_then(tui::run);
    match outcome {
        Ok(tui::Outcome::Finished) => {
            info!("[PHASE: tui] [STEP: exit] Wizard finished");
        }
        Ok(tui::Outcome::Cancelled) => {
            info!("[PHASE: tui] [STEP: exit] Wizard cancelled");
            std::process::exit(2);
        }
        Err(e) => {
            error!("[PHASE: tui] [STEP: fatal] TUI exited with error: {:?}", e);
            eprintln!("Wizard error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Non-interactive TUI smoke mode (for automated checks).
/// Renders a single frame into an in-memory terminal and exits 0/1.
pub fn run_tui_smoke(settings: &WizardSettings, target: Option<String>) {
    start_logging(settings, false);

    let target = target.as_deref().unwrap_or("first");
    if let Err(e) = build_wizard(settings).and_then(|w| tui::smoke(w, target)) {
        error!(
            "[PHASE: tui] [STEP: smoke] TUI smoke exited with error: {:?}",
            e
        );
        eprintln!("Wizard error: {:#}", e);
        std::process::exit(1);
    }
}

/// Print the compiled navigation graph and the last step for the initial properties.
pub fn run_dump_graph(settings: &WizardSettings) {
    start_logging(settings, settings.log_stdout);

    match dump_graph(settings) {
        Ok(text) => print!("{}", text),
        Err(e) => {
            error!("[PHASE: graph] [STEP: dump] Failed: {:?}", e);
            eprintln!("Wizard error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn dump_graph(settings: &WizardSettings) -> Result<String> {
    let wizard = build_wizard(settings)?;
    let graph = wizard.graph();
    let properties = &wizard.context().properties;
    let last = graph
        .last_step(properties)
        .context("Failed to resolve the last step")?;
    Ok(format!(
        "{}\nlast step: {}\n",
        graph,
        graph.step_name(last)
    ))
}
