use clap::Parser;
use gcp_flowlogs_reader::cli::{Action, KNOWN_ACTIONS};
use gcp_flowlogs_reader::configuration::Args;
use gcp_flowlogs_reader::error_handling::types::{ActionError, CliError};
use gcp_flowlogs_reader::Reader;
use log::debug;
use std::io::{self, BufWriter};
use std::process::ExitCode;

fn run(args: &Args, action: Action) -> Result<(), CliError> {
    let config = args.reader_config()?;
    debug!("Resolved configuration: {:?}", config);
    let reader = Reader::connect(&config)?;
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    action.run(reader, &mut out)
}

fn main() -> ExitCode {
    // Records go to stdout, diagnostics to stderr; RUST_LOG raises the level.
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .format_target(false)
        .init();

    let args = Args::parse();

    let action = match Action::parse(&args.action) {
        Ok(action) => action,
        Err(e @ ActionError::Unknown(_)) => {
            eprintln!("{}", e);
            eprintln!("known actions: {}", KNOWN_ACTIONS.join(", "));
            return ExitCode::from(2);
        }
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(2);
        }
    };

    match run(&args, action) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
