use log::warn;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::str::FromStr;
use std::time::Duration;

pub const BIND_ADDR_VAR: &str = "TIMETABLE_BIND_ADDR";
pub const TIME_BUDGET_VAR: &str = "TIMETABLE_TIME_BUDGET_MS";
pub const LOG_VAR: &str = "TIMETABLE_LOG";

const DEFAULT_BIND_ADDR: SocketAddr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 8080));
const DEFAULT_TIME_BUDGET_MS: u64 = 8000;
const DEFAULT_LOG_FILTER: &str = "info";

/// Logger settings: filter from `TIMETABLE_LOG`, `info` when unset.
pub fn logger_env() -> env_logger::Env<'static> {
    env_logger::Env::new().filter_or(LOG_VAR, DEFAULT_LOG_FILTER)
}

/// Host server settings, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Budget for solve requests that do not name one.
    pub default_time_budget: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Unparseable values fall back to the default with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let bind_addr = parse_var(&lookup, BIND_ADDR_VAR).unwrap_or(DEFAULT_BIND_ADDR);
        let budget_ms = parse_var(&lookup, TIME_BUDGET_VAR).unwrap_or(DEFAULT_TIME_BUDGET_MS);
        Self {
            bind_addr,
            default_time_budget: Duration::from_millis(budget_ms),
        }
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring invalid {}={:?}; using the default.", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.bind_addr, SocketAddr::from(([127, 0, 0, 1], 8080)));
        assert_eq!(cfg.default_time_budget, Duration::from_millis(8000));
    }

    #[test]
    fn reads_overrides() {
        let cfg = ServerConfig::from_lookup(lookup(&[
            (BIND_ADDR_VAR, "0.0.0.0:9000"),
            (TIME_BUDGET_VAR, " 250 "),
        ]));
        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.default_time_budget, Duration::from_millis(250));
    }

    #[test]
    fn invalid_values_fall_back() {
        let cfg = ServerConfig::from_lookup(lookup(&[
            (BIND_ADDR_VAR, "not an address"),
            (TIME_BUDGET_VAR, "-5"),
        ]));
        assert_eq!(cfg, ServerConfig::default());
    }
}
