use std::{path::PathBuf, time::Duration};

use anyhow::{Context, bail};
use clap::Parser;
use suid::{Config, ConfigUpdate, DEFAULT_POOL_KEY};

/// Command line configuration for `suid-cli`.
///
/// Every option falls back to an environment variable, which may also come
/// from a `.env` file in the working directory.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "suid-cli",
    version,
    about = "Issues service-unique IDs from a locally persisted block pool"
)]
pub struct CliArgs {
    /// URL of the block allocator, e.g. `http://ids.example.com/suid/suid.json`.
    ///
    /// Without a server only blocks already in the pool are used.
    ///
    /// Environment variable: `SUID_SERVER`
    #[arg(long, env = "SUID_SERVER")]
    pub server: Option<String>,

    /// Pool size below which more blocks are requested. Defaults to 3.
    ///
    /// Environment variable: `SUID_MIN`
    #[arg(long, env = "SUID_MIN")]
    pub min: Option<usize>,

    /// Pool size replenishment aims for. Defaults to 4.
    ///
    /// Environment variable: `SUID_MAX`
    #[arg(long, env = "SUID_MAX")]
    pub max: Option<usize>,

    /// Options in attribute syntax, e.g. `{'server': '/suid.json', 'seed': ['14she']}`.
    ///
    /// Applied first; `--server`, `--min` and `--max` override it.
    ///
    /// Environment variable: `SUID_OPTIONS`
    #[arg(long, env = "SUID_OPTIONS")]
    pub options: Option<String>,

    /// Directory holding the persisted pool.
    ///
    /// Environment variable: `SUID_STORE_DIR`
    #[arg(long, env = "SUID_STORE_DIR", default_value = ".suid")]
    pub store_dir: PathBuf,

    /// Key the pool is stored under.
    ///
    /// Environment variable: `SUID_POOL_KEY`
    #[arg(long, env = "SUID_POOL_KEY", default_value_t = String::from(DEFAULT_POOL_KEY))]
    pub pool_key: String,

    /// Number of IDs to print.
    ///
    /// Environment variable: `SUID_COUNT`
    #[arg(short = 'n', long, env = "SUID_COUNT", default_value_t = 1)]
    pub count: usize,

    /// How long to wait for the pool to hold a block, in milliseconds.
    ///
    /// Environment variable: `SUID_READY_TIMEOUT_MS`
    #[arg(long, env = "SUID_READY_TIMEOUT_MS", default_value_t = 10_000)]
    pub ready_timeout_ms: u64,
}

#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Updates applied in order: parsed options, then explicit flags.
    pub updates: Vec<ConfigUpdate>,
    /// What the dispenser starts with once `updates` are merged.
    pub effective: Config,
    pub store_dir: PathBuf,
    pub pool_key: String,
    pub count: usize,
    pub ready_timeout: Duration,
}

impl TryFrom<CliArgs> for CliConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.count == 0 {
            bail!("SUID_COUNT must be greater than 0");
        }
        if args.pool_key.is_empty() {
            bail!("SUID_POOL_KEY must not be empty");
        }

        let mut updates = Vec::with_capacity(2);
        if let Some(options) = &args.options {
            let update =
                ConfigUpdate::from_options(options).context("SUID_OPTIONS is malformed")?;
            updates.push(update);
        }
        updates.push(ConfigUpdate {
            server: args.server,
            min: args.min,
            max: args.max,
            seed: None,
        });

        let mut effective = Config::default();
        for update in &updates {
            effective.merge(update);
        }
        if effective.min > effective.max {
            bail!(
                "SUID_MIN ({}) must not exceed SUID_MAX ({})",
                effective.min,
                effective.max
            );
        }

        Ok(Self {
            updates,
            effective,
            store_dir: args.store_dir,
            pool_key: args.pool_key,
            count: args.count,
            ready_timeout: Duration::from_millis(args.ready_timeout_ms),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<CliConfig> {
        let args = CliArgs::try_parse_from(std::iter::once("suid-cli").chain(args.iter().copied()))?;
        CliConfig::try_from(args)
    }

    #[test]
    fn flags_override_options() {
        let config = parse(&[
            "--options",
            "{'server': '/a.json', 'min': 1, 'max': 9}",
            "--server",
            "/b.json",
            "--max",
            "5",
        ])
        .unwrap();
        assert_eq!(config.effective.server.as_deref(), Some("/b.json"));
        assert_eq!((config.effective.min, config.effective.max), (1, 5));
        assert_eq!(config.updates.len(), 2);
    }

    #[test]
    fn options_seed_is_kept_for_the_pool() {
        let config = parse(&["--options", "{'seed': ['14she', 1903282]}"]).unwrap();
        assert_eq!(
            config.updates[0].seed.as_deref(),
            Some(&[suid::Suid::from_raw(1_903_154), suid::Suid::from_raw(1_903_282)][..])
        );
    }

    #[test]
    fn rejects_inverted_bounds() {
        let err = parse(&["--min", "5", "--max", "2"]).unwrap_err();
        assert!(err.to_string().contains("must not exceed"));
    }

    #[test]
    fn rejects_malformed_options() {
        let err = parse(&["--options", "{'min': "]).unwrap_err();
        assert!(err.to_string().contains("SUID_OPTIONS"));
    }

    #[test]
    fn rejects_zero_count() {
        assert!(parse(&["--count", "0"]).is_err());
    }
}
