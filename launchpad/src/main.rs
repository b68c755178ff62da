//! Launchpad - Entry Point
//!
//! Submits a GitHub repository to the build backend and follows its logs,
//! either once from the command line (`--deploy=<url>`) or as a local control
//! server for a rendering layer.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use colored::Colorize;
use launchpad::app::options::AppOptions;
use launchpad::app::run::{deploy, run};
use launchpad::deploy::phase::Phase;
use launchpad::deploy::session::SessionSnapshot;
use launchpad::filesys::file::File;
use launchpad::logs::{init_logging, LogOptions};
use launchpad::storage::layout::StorageLayout;
use launchpad::storage::settings::Settings;
use launchpad::utils::version_info;

use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    if cli_args.contains_key("version") {
        match serde_json::to_string_pretty(&version_info()) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to render version: {}", e),
        }
        return ExitCode::SUCCESS;
    }

    let (layout, settings_file) = match cli_args.get("config") {
        Some(path) => {
            let path = PathBuf::from(path);
            let base_dir = path.parent().map(PathBuf::from).unwrap_or_default();
            (StorageLayout::new(base_dir), File::new(path))
        }
        None => {
            let layout = StorageLayout::default();
            let settings_file = layout.settings_file();
            (layout, settings_file)
        }
    };

    if cli_args.contains_key("init-config") {
        return init_config(&settings_file).await;
    }

    let settings = match settings_file.read_json_or_default::<Settings>().await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Unable to read settings file {}: {}", settings_file.path().display(), e);
            return ExitCode::FAILURE;
        }
    };

    let log_options = LogOptions {
        log_level: settings.log_level.clone(),
        log_dir: layout.logs_dir(),
        to_file: settings.log_to_file,
        json_format: settings.log_json,
        ..Default::default()
    };
    if let Err(e) = init_logging(log_options) {
        println!("Failed to initialize logging: {e}");
    }

    let mut options = AppOptions::from(&settings);

    if let Some(repo_url) = cli_args.get("deploy") {
        options.enable_server = false;
        return deploy_once(options, repo_url.clone()).await;
    }

    info!("Running launchpad with options: {:?}", options);
    match run(options, await_shutdown_signal()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Failed to run launchpad: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn init_config(settings_file: &File) -> ExitCode {
    match settings_file.write_json(&Settings::default()).await {
        Ok(()) => {
            println!("Wrote default settings to {}", settings_file.path().display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Unable to write {}: {}", settings_file.path().display(), e);
            ExitCode::FAILURE
        }
    }
}

async fn deploy_once(options: AppOptions, repo_url: String) -> ExitCode {
    let mut printer = LogPrinter::default();
    let outcome = deploy(options, repo_url, await_shutdown_signal(), |snapshot| {
        printer.print(snapshot)
    })
    .await;

    match outcome {
        Ok(Phase::Success) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(1),
        Err(e) => {
            eprintln!("{}", e.to_string().red());
            ExitCode::from(2)
        }
    }
}

/// Prints what changed between consecutive snapshots
#[derive(Default)]
struct LogPrinter {
    printed_lines: usize,
    phase: Phase,
    preview_shown: bool,
}

impl LogPrinter {
    fn print(&mut self, snapshot: &SessionSnapshot) {
        if snapshot.phase != self.phase {
            self.phase = snapshot.phase;
            let badge = match snapshot.phase {
                Phase::Idle => "Ready to Deploy".normal(),
                Phase::Submitting => "Deploying...".blue(),
                Phase::Building => "Building".yellow(),
                Phase::Success => "Deployed".green().bold(),
                Phase::Failed => "Failed".red().bold(),
            };
            println!("[{}]", badge);
        }

        if let (Some(url), false) = (&snapshot.preview_url, self.preview_shown) {
            self.preview_shown = true;
            println!("Deployment URL: {}", url.cyan().underline());
        }

        for line in snapshot.logs.iter().skip(self.printed_lines) {
            println!("{}", format!("> {}", line).green());
        }
        self.printed_lines = snapshot.logs.len();
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {
                        info!("SIGTERM received, shutting down...");
                    }
                    _ = sigint.recv() => {
                        info!("SIGINT received, shutting down...");
                    }
                }
            }
            _ => {
                let _ = tokio::signal::ctrl_c().await;
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Ctrl+C received, shutting down...");
    }
}
