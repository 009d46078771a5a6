//! fixture-harness CLI entry point

fn main() {
    // Structured logging goes to stderr; default to warn so stdout only carries test progress
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .try_init();

    fixture_harness::cli::run();
}
