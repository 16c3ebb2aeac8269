use anyhow::{bail, Context, Result};
use clap::Parser;
use config::Environment;
use ledger_config::ledger_config::{
    COLL_ELG_PROC_DB_BATCHES_INTERVAL, COLL_ELG_PROC_MAX_DB_BATCH_SIZE, TOTAL_QUERY_LIMIT,
};
use ledger_config::{ConfKey, Config};
use std::io::{self, Write};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "ledger-config",
    version = "0.1.0",
    about = "Prints the ledger settings a peer would run with"
)]
struct Args {
    /// Path to config directory
    #[arg(short, long, default_value = "config")]
    config_dir: String,

    /// Print only the resolved value of this key, e.g. ledger.state.totalQueryLimit
    #[arg(short, long)]
    key: Option<String>,
}

fn setup_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,ledger_config=debug"));

    fmt()
        .with_env_filter(env_filter)
        .with_timer(fmt::time::SystemTime)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_level(true)
        .with_writer(io::stderr)
        .init();
}

fn run(args: &Args, environment: Environment, out: &mut impl Write) -> Result<()> {
    let config = Config::with_environment(&args.config_dir, environment)
        .context("Failed to load configuration")?;

    if let Some(name) = &args.key {
        let Some(key) = ConfKey::find(name) else {
            bail!("Unknown ledger key: {name}");
        };
        let value = config
            .get_setting(key)
            .with_context(|| format!("Failed to read {}", key.name))?;
        writeln!(out, "{value}")?;
        return Ok(());
    }

    let settings = config
        .ledger_settings()
        .context("Failed to get ledger settings")?;
    info!("Resolved ledger settings from {}", args.config_dir);

    writeln!(out, "{} = {}", TOTAL_QUERY_LIMIT.name, settings.total_query_limit())?;
    writeln!(
        out,
        "{} = {}",
        COLL_ELG_PROC_MAX_DB_BATCH_SIZE.name,
        settings.coll_elg_proc_max_db_batch_size()
    )?;
    writeln!(
        out,
        "{} = {}",
        COLL_ELG_PROC_DB_BATCHES_INTERVAL.name,
        settings.coll_elg_proc_db_batches_interval().as_millis()
    )?;

    Ok(())
}

fn main() -> Result<()> {
    setup_tracing();

    let args = Args::parse();
    run(&args, Config::environment_source(), &mut io::stdout().lock())
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::Map;
    use pretty_assertions::assert_eq;

    const SHIPPED_CONFIG_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/config");

    fn no_environment() -> Environment {
        Config::environment_source().source(Some(Map::new()))
    }

    fn run_to_string(args: &Args) -> Result<String> {
        let mut out = Vec::new();
        run(args, no_environment(), &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_prints_single_key() {
        let args = Args::parse_from([
            "ledger-config",
            "--config-dir",
            SHIPPED_CONFIG_DIR,
            "--key",
            "ledger.state.totalQueryLimit",
        ]);

        assert_eq!(run_to_string(&args).unwrap(), "100000\n");
    }

    #[test]
    fn test_prints_all_settings() {
        let args = Args::parse_from(["ledger-config", "--config-dir", SHIPPED_CONFIG_DIR]);

        assert_eq!(
            run_to_string(&args).unwrap(),
            "ledger.state.totalQueryLimit = 100000\n\
             ledger.pvtdataStore.collElgProcMaxDbBatchSize = 5000\n\
             ledger.pvtdataStore.collElgProcDbBatchesInterval = 1000\n"
        );
    }

    #[test]
    fn test_unknown_key_fails() {
        let args = Args::parse_from([
            "ledger-config",
            "--config-dir",
            SHIPPED_CONFIG_DIR,
            "--key",
            "ledger.state.nope",
        ]);

        let err = run_to_string(&args).unwrap_err();
        assert_eq!(err.to_string(), "Unknown ledger key: ledger.state.nope");
    }

    #[test]
    fn test_missing_config_dir_fails() {
        let tmp_dir = tempfile::TempDir::new().unwrap();
        let missing = tmp_dir.path().join("missing");
        let args = Args::parse_from([
            "ledger-config",
            "--config-dir",
            missing.to_str().unwrap(),
        ]);

        let err = run_to_string(&args).unwrap_err();
        assert_eq!(err.to_string(), "Failed to load configuration");
    }
}
