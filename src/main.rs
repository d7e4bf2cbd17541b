use std::panic;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

use editstack::config::EngineConfig;
use editstack::script::Script;

struct Args {
    script: PathBuf,
    config: Option<PathBuf>,
}

/// Parse command line arguments
fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut script: Option<PathBuf> = None;
    let mut config: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-c" | "--config" => {
                if i + 1 < args.len() {
                    config = Some(PathBuf::from(&args[i + 1]));
                    i += 2;
                } else {
                    eprintln!("Error: --config requires an argument");
                    std::process::exit(1);
                }
            }
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            arg if arg.starts_with('-') => {
                eprintln!("Unknown option: {}", arg);
                std::process::exit(1);
            }
            _ => {
                script = Some(PathBuf::from(&args[i]));
                i += 1;
            }
        }
    }

    let Some(script) = script else {
        print_help();
        std::process::exit(1);
    };
    Args { script, config }
}

/// Log panics through tracing before the default hook runs
fn install_panic_hook() {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        if let Some(location) = info.location() {
            error!(
                file = location.file(),
                line = location.line(),
                "panic occurred"
            );
        } else {
            error!("panic occurred");
        }

        if let Some(s) = info.payload().downcast_ref::<&str>() {
            error!(message = %s);
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            error!(message = %s);
        }

        default_hook(info);
    }));
}

fn print_help() {
    eprintln!("editstack - replay a scripted editing session through the undo/redo engine");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("    editstack [OPTIONS] <SCRIPT>");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("    -c, --config <FILE>  Engine settings (history_limit, debounce_ms) as TOML");
    eprintln!("    -h, --help           Print this help message");
    eprintln!();
    eprintln!("The final history, pending edits, saved batches and preview are printed as JSON.");
}

fn run(args: &Args) -> Result<(), String> {
    let config = match &args.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    let script = Script::from_file(&args.script)?;
    info!(steps = script.steps.len(), elements = script.elements.len(), "replaying script");

    let report = script.replay(&config);
    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| format!("Failed to serialize report: {}", e))?;
    println!("{}", json);
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    install_panic_hook();

    let args = parse_args();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "replay failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
