use install_wizard::WizardSettings;
use std::path::PathBuf;

const USAGE: &str = "Usage: install-wizard [--settings <file>] [--spec <file>] [--dump-graph | --tui-smoke[=first|last]]";

/// Value of `--name <value>` or `--name=<value>`.
fn flag_value(args: &[String], name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    args.iter().enumerate().find_map(|(i, a)| {
        if a == name {
            args.get(i + 1).cloned()
        } else {
            a.strip_prefix(&prefix).map(str::to_string)
        }
    })
    .filter(|v| !v.trim().is_empty())
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("{}", USAGE);
        return;
    }

    // Settings: defaults < wizard.toml / --settings file < WIZARD_* environment < --spec
    let settings_file = flag_value(&args, "--settings").map(PathBuf::from);
    let mut settings = match WizardSettings::load(settings_file.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Wizard error: {:#}", e);
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    };
    if let Some(spec) = flag_value(&args, "--spec") {
        settings.spec = Some(PathBuf::from(spec));
    }

    // Print the compiled navigation graph and exit.
    if args.iter().any(|a| a == "--dump-graph") {
        install_wizard::run_dump_graph(&settings);
        return;
    }

    // Non-interactive TUI smoke test mode (for automated checks).
    // Renders a single frame and exits 0.
    // Usage: --tui-smoke or --tui-smoke=first|last
    if let Some(arg) = args
        .iter()
        .find(|a| a.as_str() == "--tui-smoke" || a.starts_with("--tui-smoke="))
    {
        let target = arg
            .split_once('=')
            .map(|(_, v)| v.to_string())
            .filter(|v| !v.trim().is_empty());
        install_wizard::run_tui_smoke(&settings, target);
        return;
    }

    install_wizard::run_tui(&settings);
}
