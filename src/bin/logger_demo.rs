use nearbuy::logger::*;
use nearbuy::settings::*;

// $ cargo run --bin logger_demo -- --log-json
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let logger = Logger::new_bootstrap(cli.log_json);
    debug!("bootstrap debug log (hidden)");
    info!(identity = 42, "bootstrap info log");

    let config = LogConfig {
        filter: "nearbuy=debug,info".to_string(),
    };
    logger.reload_from_config(&config)?;
    debug!(item = 7, score = 12, "application debug log");
    warn!(reason = "token mismatch", "application warn log");

    Ok(())
}
