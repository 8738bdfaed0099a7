use clap::Parser;
use ticktrader::cli::{run, Cli};
use ticktrader::logging::init_logging;

fn main() -> std::process::ExitCode {
    init_logging();
    run(Cli::parse())
}
