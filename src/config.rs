use std::{net::SocketAddr, str::FromStr, time::Duration};

use anyhow::{bail, Context};

/// Largest window whose millisecond value still fits an `i64` timestamp.
const MAX_WINDOW_SECS: u64 = i64::MAX as u64 / 1000;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub sweep: SweepConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    /// Time between two sweep ticks.
    pub interval: Duration,
    /// A participant silent for at least this long is evicted.
    pub inactivity_window: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        SweepConfig {
            interval: Duration::from_secs(15),
            inactivity_window: Duration::from_secs(10),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 5000)),
            database_url: "sqlite://batepapo.db?mode=rwc".to_owned(),
            sweep: SweepConfig::default(),
        }
    }
}

impl Config {
    /// Reads the process environment, after loading `.env` if there is one.
    pub fn from_env() -> anyhow::Result<Config> {
        Config::from_lookup(|key| dotenv::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Config> {
        let defaults = Config::default();

        let bind_address = parse_or(&lookup, "BIND_ADDRESS", defaults.bind_address)?;
        let database_url = lookup("DATABASE_URL").unwrap_or(defaults.database_url);

        let interval = parse_or(&lookup, "SWEEP_INTERVAL_SECS", defaults.sweep.interval.as_secs())?;
        if interval == 0 {
            bail!("SWEEP_INTERVAL_SECS must be greater than zero");
        }
        let inactivity_window = parse_or(
            &lookup,
            "INACTIVITY_WINDOW_SECS",
            defaults.sweep.inactivity_window.as_secs(),
        )?;
        if inactivity_window > MAX_WINDOW_SECS {
            bail!("INACTIVITY_WINDOW_SECS must be at most {MAX_WINDOW_SECS}");
        }

        Ok(Config {
            bind_address,
            database_url,
            sweep: SweepConfig {
                interval: Duration::from_secs(interval),
                inactivity_window: Duration::from_secs(inactivity_window),
            },
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid {key}: {raw:?}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        assert_eq!(Config::from_lookup(lookup(&[])).unwrap(), Config::default());
    }

    #[test]
    fn overrides_are_applied() {
        let config = Config::from_lookup(lookup(&[
            ("BIND_ADDRESS", "127.0.0.1:8080"),
            ("DATABASE_URL", "sqlite::memory:"),
            ("SWEEP_INTERVAL_SECS", "3"),
            ("INACTIVITY_WINDOW_SECS", " 2 "),
        ]))
        .unwrap();

        assert_eq!(config.bind_address, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.sweep.interval, Duration::from_secs(3));
        assert_eq!(config.sweep.inactivity_window, Duration::from_secs(2));
    }

    #[test]
    fn bad_values_are_reported_by_name() {
        let err = Config::from_lookup(lookup(&[("SWEEP_INTERVAL_SECS", "soon")])).unwrap_err();
        assert!(err.to_string().contains("SWEEP_INTERVAL_SECS"));

        let err = Config::from_lookup(lookup(&[("SWEEP_INTERVAL_SECS", "0")])).unwrap_err();
        assert!(err.to_string().contains("greater than zero"));

        let err = Config::from_lookup(lookup(&[("INACTIVITY_WINDOW_SECS", "10000000000000000")])).unwrap_err();
        assert!(err.to_string().contains("INACTIVITY_WINDOW_SECS"));

        let edge = MAX_WINDOW_SECS.to_string();
        let config = Config::from_lookup(lookup(&[("INACTIVITY_WINDOW_SECS", edge.as_str())])).unwrap();
        assert_eq!(config.sweep.inactivity_window, Duration::from_secs(MAX_WINDOW_SECS));
    }
}
