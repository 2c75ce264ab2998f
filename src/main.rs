use anyhow::{Context, Result};
use prism::logging::{init_logging, LoggingConfig};

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    prism::default()
        .context("failed to start viewer")?
        .run()
        .context("viewer stopped with an error")
}
