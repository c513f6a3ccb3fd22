use clap::Parser;
use gatepass_core::Cli;

fn main() {
    let cli = Cli::parse();
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.default_log_filter()));
    // Avoid panic if a global subscriber is already set.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .ok();

    if let Err(err) = gatepass_core::run(&cli.into_options()) {
        eprintln!("Error: {err}");
        for cause in err.chain().skip(1) {
            eprintln!("  -> {cause}");
        }
        std::process::exit(1);
    }
}
