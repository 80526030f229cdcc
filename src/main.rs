//! Network Analyzer - Main CLI Application
//!
//! Collects the state of one macOS network interface from the system tools,
//! optionally measures internet performance, and grades the connection.

use clap::Parser;
use network_analyzer::{
    analyzer::{AnalyzeOptions, Analysis, Analyzer},
    cli::Cli,
    command::{CommandRunner, ReplayRunner, SystemRunner},
    config::{display_config_summary, load_config, EnvManager},
    error::{AppError, ErrorReporter, Result},
    output::{render_json, OutputCoordinator},
    HealthCategory, BUILD_TIME, GIT_COMMIT, PKG_NAME, TARGET_TRIPLE, VERSION,
};
use std::process;
use std::sync::Arc;

/// Exit status for a completed run graded Critical under `--strict`
const EXIT_CRITICAL: i32 = 4;

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        process::exit(AppError::internal("panic").exit_code());
    }));

    let cli = Cli::parse();

    if cli.env_help {
        print!("{}", EnvManager::display_env_help());
        return;
    }

    if let Err(message) = cli.validate() {
        eprintln!("Error: {}", message);
        process::exit(AppError::config(message).exit_code());
    }

    let use_color = cli.use_colors();
    let verbose = cli.verbose;

    match run_application(cli).await {
        Ok(code) => process::exit(code),
        Err(e) => {
            ErrorReporter::new(use_color, verbose).report_error(&e);
            process::exit(e.exit_code());
        }
    }
}

/// Main application logic; returns the process exit status
async fn run_application(cli: Cli) -> Result<i32> {
    let replay = cli.replay.clone();
    let config = load_config(cli)?;

    colored::control::set_override(config.enable_color);

    if config.debug {
        eprintln!("{} v{} ({}, built {} for {})", PKG_NAME, VERSION, GIT_COMMIT, BUILD_TIME, TARGET_TRIPLE);
        eprintln!("{}", display_config_summary(&config));
        for warning in EnvManager::validate_current_env() {
            eprintln!("{}", warning);
        }
        eprintln!();
    }

    #[cfg(non_macos_host)]
    if replay.is_none() && !config.json_output {
        let coordinator = OutputCoordinator::for_terminal(config.enable_color, config.verbose);
        eprintln!(
            "{}",
            coordinator.display_warning("this build targets a non-macOS host; most collectors will find their tools absent")?
        );
    }

    let runner: Arc<dyn CommandRunner> = match replay {
        Some(path) => Arc::new(ReplayRunner::from_file(&path)?),
        None => Arc::new(SystemRunner::new()),
    };

    let options = AnalyzeOptions::from_config(&config)?;
    let interface = config.interface.clone();
    let requested = config.mode;
    let analyzer = Analyzer::new(runner, config.clone());

    let token = analyzer.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });

    let analysis = analyzer.analyze(interface.as_deref(), requested, &options).await?;

    if config.json_output {
        println!("{}", render_json(&analysis)?);
    } else {
        let coordinator = OutputCoordinator::for_terminal(config.enable_color, config.verbose);
        println!("{}", coordinator.display_analysis(&analysis)?);
    }

    Ok(exit_status(&analysis, config.strict))
}

/// Interrupted runs report their interruption; otherwise `--strict` turns
/// a Critical grade into a failure
fn exit_status(analysis: &Analysis, strict: bool) -> i32 {
    if let Some(interruption) = analysis.interruption {
        return interruption.to_error().exit_code();
    }
    if strict && analysis.assessment.category == HealthCategory::Critical {
        return EXIT_CRITICAL;
    }
    0
}
