mod commands;

use std::fs::File;
use std::process::ExitCode;

use amsynth_core::config::Config;

use commands::{CliError, Context, Invocation};

fn init_logging(verbose: bool) {
    use simplelog::*;

    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };

    let log_path = dirs::config_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("amsynth")
        .join("amsynth-banks.log");

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = File::create(&log_path).unwrap_or_else(|_| {
        File::create(std::env::temp_dir().join("amsynth-banks.log"))
            .expect("Cannot create log file")
    });

    WriteLogger::init(log_level, simplelog::Config::default(), log_file)
        .expect("Failed to initialize logger");

    log::info!("amsynth-banks starting (log level: {:?})", log_level);
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let invocation = match Invocation::parse(&args) {
        Ok(invocation) => invocation,
        Err(e) => {
            eprintln!("{}\n\n{}", e, commands::USAGE);
            return ExitCode::FAILURE;
        }
    };
    init_logging(invocation.verbose);

    let mut context = Context::new(Config::load());
    let mut stdout = std::io::stdout().lock();
    match invocation.run(&mut context, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Usage(msg)) => {
            eprintln!("{}\n\n{}", msg, commands::USAGE);
            ExitCode::FAILURE
        }
        Err(e) => {
            log::error!("{}", e);
            eprintln!("amsynth-banks: {}", e);
            ExitCode::FAILURE
        }
    }
}
