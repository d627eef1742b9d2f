use clap::Parser;
use kistrader::cli::{Cli, run};
use kistrader::logging::init_logging;

#[tokio::main(flavor = "current_thread")]
async fn main() -> std::process::ExitCode {
    init_logging();
    run(Cli::parse()).await
}
