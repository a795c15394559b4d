use docdb_testkit::logging;

mod cli;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    if let Err(err) = logging::init_logging() {
        logging::init_logging_stderr();
        tracing::warn!("file logging unavailable: {err:#}");
    }

    if let Err(err) = Cli::run_from_args().await {
        eprintln!("docdb-testkit error: {:#}", err);
        std::process::exit(1);
    }
}
