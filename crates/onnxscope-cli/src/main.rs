mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{is_usage_error, Cli, USAGE_EXIT_CODE};
use onnxscope_backend_ort::OrtBackend;
use onnxscope_inspect::{inspect, report_dummy_run, run_with_backend};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if is_usage_error(&err) => {
            print!("{}", err.render());
            std::process::exit(USAGE_EXIT_CODE);
        }
        Err(err) => err.exit(),
    };

    init_tracing(&cli.log)?;

    // Everything is rendered before anything is printed, so a failure
    // leaves standard output empty.
    let report = run(&cli)?;
    print!("{report}");
    Ok(())
}

fn init_tracing(filter: &str) -> Result<()> {
    let filter =
        EnvFilter::try_new(filter).with_context(|| format!("invalid log filter '{filter}'"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn run(cli: &Cli) -> Result<String> {
    let mut report = inspect(&cli.model, &cli.report_options())?;

    if cli.run {
        tracing::info!(device = ?cli.device, "starting dummy run");
        let dummy = run_with_backend(&OrtBackend::new(), &cli.model, cli.device)?;
        report.push_str(&report_dummy_run(&dummy));
    }

    Ok(report)
}
