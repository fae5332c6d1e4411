use std::env;

use chrono::Duration;
use courier_tools::PushGatewayConfig;
use dispatch_common::parse_boolean_flag;
use log::*;

const DEFAULT_DDS_HOST: &str = "127.0.0.1";
const DEFAULT_DDS_PORT: u16 = 8460;
const SWEEP_INTERVAL_SECS: u64 = 60;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// How long an assignment request may sit in `Pending` before the sweep worker marks it
    /// `Expired`. `None` disables the sweep entirely.
    pub pending_request_timeout: Option<Duration>,
    /// Seconds between sweep runs. Only meaningful when the sweep is enabled.
    pub sweep_interval_secs: u64,
    /// Push gateway configuration. `None` when pushes are disabled; dispatch still works, riders
    /// just don't get device notifications.
    pub push_config: Option<PushGatewayConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_DDS_HOST.to_string(),
            port: DEFAULT_DDS_PORT,
            database_url: String::default(),
            pending_request_timeout: None,
            sweep_interval_secs: SWEEP_INTERVAL_SECS,
            push_config: None,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("DDS_HOST").ok().unwrap_or_else(|| DEFAULT_DDS_HOST.into());
        let port = env::var("DDS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for DDS_PORT. {e} Using the default, {DEFAULT_DDS_PORT}, instead."
                    );
                    DEFAULT_DDS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_DDS_PORT);
        let database_url = env::var("DDS_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ DDS_DATABASE_URL is not set. Please set it to the URL for the dispatch database.");
            String::default()
        });
        let pending_request_timeout = configure_request_timeout();
        let push_enabled = parse_boolean_flag(env::var("DDS_PUSH_ENABLED").ok(), false);
        let push_config = if push_enabled {
            Some(PushGatewayConfig::new_from_env_or_default())
        } else {
            info!("🪛️ DDS_PUSH_ENABLED is not set. Rider device notifications are disabled.");
            None
        };
        Self {
            host,
            port,
            database_url,
            pending_request_timeout,
            sweep_interval_secs: SWEEP_INTERVAL_SECS,
            push_config,
        }
    }
}

fn configure_request_timeout() -> Option<Duration> {
    let timeout = env::var("DDS_PENDING_REQUEST_TIMEOUT")
        .map_err(|_| {
            info!("🪛️ DDS_PENDING_REQUEST_TIMEOUT is not set. The stale-request sweep is disabled.");
        })
        .and_then(|s| {
            s.parse::<i64>()
                .map(Duration::minutes)
                .map_err(|e| warn!("🪛️ Invalid configuration value for DDS_PENDING_REQUEST_TIMEOUT. {e}"))
        })
        .ok()?;
    if timeout <= Duration::zero() {
        warn!("🪛️ DDS_PENDING_REQUEST_TIMEOUT must be a positive number of minutes. The sweep is disabled.");
        return None;
    }
    info!("🪛️ Pending assignment requests expire after {} minutes.", timeout.num_minutes());
    Some(timeout)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8460);
        assert!(config.pending_request_timeout.is_none());
        assert!(config.push_config.is_none());
    }

    #[test]
    fn timeout_parsing() {
        temp_env(&[("DDS_PENDING_REQUEST_TIMEOUT", Some("30"))], || {
            assert_eq!(configure_request_timeout(), Some(Duration::minutes(30)));
        });
        temp_env(&[("DDS_PENDING_REQUEST_TIMEOUT", Some("not-a-number"))], || {
            assert_eq!(configure_request_timeout(), None);
        });
        temp_env(&[("DDS_PENDING_REQUEST_TIMEOUT", Some("-5"))], || {
            assert_eq!(configure_request_timeout(), None);
        });
        temp_env(&[("DDS_PENDING_REQUEST_TIMEOUT", None)], || {
            assert_eq!(configure_request_timeout(), None);
        });
    }

    fn temp_env(vars: &[(&str, Option<&str>)], f: impl FnOnce()) {
        for (k, v) in vars {
            match v {
                Some(v) => env::set_var(k, v),
                None => env::remove_var(k),
            }
        }
        f();
        for (k, _) in vars {
            env::remove_var(k);
        }
    }
}
