use std::{error::Error, fs, process::ExitCode};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tradectl::{
    cli::{Cli, Commands, parse_args},
    config::{Config, load_config},
    error::ControlError,
    manager::{CommandRunner, DryRunRunner, SystemRunner},
    privilege,
    runtime::{self, RuntimeMode},
    sequencer::Sequencer,
    unit::render_template,
};

fn main() -> ExitCode {
    let args = parse_args();
    init_logging(&args);

    match run(args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Cli) -> Result<ExitCode, Box<dyn Error>> {
    if args.sys {
        privilege::require_root("--sys")?;
        runtime::init(RuntimeMode::System);
    } else {
        runtime::init(RuntimeMode::User);
    }

    let config = load_config(args.config.as_deref())?;

    let runner: Box<dyn CommandRunner> = if args.dry_run {
        Box::new(DryRunRunner)
    } else {
        Box::new(SystemRunner)
    };
    let sequencer = Sequencer::from_config(&config, runner, args.dry_run)?;

    match args.command {
        Commands::Install => {
            let outcome = sequencer.install()?;
            println!(
                "{}: {outcome}",
                sequencer.unit().install_path().display()
            );
        }
        Commands::Reload => sequencer.reload()?,
        Commands::Enable => sequencer.enable_and_start()?,
        Commands::Start => sequencer.start()?,
        Commands::Stop => sequencer.stop()?,
        Commands::Restart => sequencer.restart()?,
        Commands::Status { json } => {
            if json {
                if let Some(status) = sequencer.status_report()? {
                    println!("{}", serde_json::to_string_pretty(&status)?);
                }
            } else {
                return Ok(passthrough(sequencer.status()?));
            }
        }
        Commands::Logs { lines, follow } => {
            info!("Fetching logs for {}", sequencer.unit().unit_name());
            return Ok(passthrough(sequencer.logs(lines, follow)?));
        }
        Commands::Linger { user } => {
            let outcome = sequencer.enable_linger(user.as_deref())?;
            println!("linger: {outcome}");
        }
        Commands::Deploy { no_linger } => {
            let report = sequencer.deploy(!no_linger)?;
            println!("install: {}", report.install);
            if let Some(linger) = report.linger {
                println!("linger: {linger}");
            }
        }
        Commands::Uninstall => {
            let removed = sequencer.uninstall()?;
            if removed && !args.dry_run {
                println!("removed {}", sequencer.unit().install_path().display());
            }
        }
        Commands::Render { output } => render(&config, output.as_deref())?,
    }

    Ok(ExitCode::SUCCESS)
}

fn init_logging(args: &Cli) {
    let filter = if let Some(level) = args.log_level {
        EnvFilter::new(level.as_str())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Mirrors the service manager's exit code.
fn passthrough(code: Option<i32>) -> ExitCode {
    match code {
        Some(0) => ExitCode::SUCCESS,
        Some(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        None => ExitCode::FAILURE,
    }
}

fn render(config: &Config, output: Option<&str>) -> Result<(), ControlError> {
    let Some(template) = &config.unit.template else {
        return Err(ControlError::NoTemplate(config.unit.name.clone()));
    };

    let rendered = render_template(template);
    match output {
        Some(path) => {
            fs::write(path, rendered)?;
            info!("Rendered {} to {path}", config.unit.name);
        }
        None => print!("{rendered}"),
    }
    Ok(())
}
