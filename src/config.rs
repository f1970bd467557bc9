use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::retry::{RetryPolicy, MAX_ATTEMPTS, RETRY_DELAY};
use crate::shared::{Error, Result};

/// Overrides `HttpConfig::user_agent` when set and non-empty
pub const USER_AGENT_ENV: &str = "HTTP_USER_AGENT";

/// Top-level configuration, loadable from a JSON file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub route_server: RouteServerConfig,
    pub http: HttpConfig,
    pub analysis: AnalysisConfig,
    pub cache: CacheConfig,
}

impl Config {
    /// Read `path` if given, otherwise start from defaults, then apply
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let text = fs::read_to_string(path)?;
                serde_json::from_str(&text)?
            }
            None => Config::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(ua) = std::env::var(USER_AGENT_ENV) {
            let ua = ua.trim();
            if !ua.is_empty() {
                self.http.user_agent = ua.to_string();
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.route_server.host.trim().is_empty() {
            return Err(Error::Config("route_server.host is empty".to_string()));
        }
        if self.analysis.max_samples == 0 {
            return Err(Error::Config("analysis.max_samples must be positive".to_string()));
        }
        if self.cache.capacity == 0 {
            return Err(Error::Config("cache.capacity must be positive".to_string()));
        }
        Ok(())
    }

    pub fn with_route_server(mut self, route_server: RouteServerConfig) -> Self {
        self.route_server = route_server;
        self
    }

    pub fn with_http(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }

    pub fn with_max_samples(mut self, max_samples: usize) -> Self {
        self.analysis.max_samples = max_samples;
        self
    }

    pub fn with_cache_dir(mut self, dir: PathBuf) -> Self {
        self.cache.dir = Some(dir);
        self
    }
}

/// Telnet route server and the CLI dialogue with it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteServerConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub connect_timeout_secs: u64,
    /// Waiting for the username and password cues
    pub login_timeout_secs: u64,
    /// Draining the banner after login
    pub banner_timeout_secs: u64,
    /// Draining the reply to each setup command
    pub setup_timeout_secs: u64,
    /// Draining a routing table dump
    pub command_timeout_secs: u64,
    /// Sent after login: disable paging, disable line wrapping
    pub setup_commands: Vec<String>,
    pub exit_command: String,
    pub retry_attempts: u32,
    pub retry_delay_secs: u64,
}

impl Default for RouteServerConfig {
    fn default() -> Self {
        RouteServerConfig {
            host: "route-server.he.net".to_string(),
            port: 23,
            username: "rviews".to_string(),
            password: "rviews".to_string(),
            connect_timeout_secs: 25,
            login_timeout_secs: 5,
            banner_timeout_secs: 10,
            setup_timeout_secs: 5,
            command_timeout_secs: 220,
            setup_commands: vec!["terminal length 0".to_string(), "terminal width 0".to_string()],
            exit_command: "exit".to_string(),
            retry_attempts: MAX_ATTEMPTS,
            retry_delay_secs: RETRY_DELAY.as_secs(),
        }
    }
}

impl RouteServerConfig {
    pub fn with_host(mut self, host: &str, port: u16) -> Self {
        self.host = host.to_string();
        self.port = port;
        self
    }

    pub fn with_retry(mut self, attempts: u32, delay_secs: u64) -> Self {
        self.retry_attempts = attempts;
        self.retry_delay_secs = delay_secs;
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn login_timeout(&self) -> Duration {
        Duration::from_secs(self.login_timeout_secs)
    }

    pub fn banner_timeout(&self) -> Duration {
        Duration::from_secs(self.banner_timeout_secs)
    }

    pub fn setup_timeout(&self) -> Duration {
        Duration::from_secs(self.setup_timeout_secs)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_attempts, Duration::from_secs(self.retry_delay_secs))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Full-table downloads get longer
    pub table_timeout_secs: u64,
    pub asns_csv_url: String,
    pub table_url: String,
    pub ip_api_url: String,
    pub ripestat_url: String,
    pub retry_attempts: u32,
    pub retry_delay_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            user_agent: "bgp-route-bot contact: none".to_string(),
            timeout_secs: 30,
            table_timeout_secs: 60,
            asns_csv_url: "https://bgp.tools/asns.csv".to_string(),
            table_url: "https://bgp.tools/table.txt".to_string(),
            ip_api_url: "https://bgp.tools/api/ip/".to_string(),
            ripestat_url: "https://stat.ripe.net/data/".to_string(),
            retry_attempts: MAX_ATTEMPTS,
            retry_delay_secs: RETRY_DELAY.as_secs(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn table_timeout(&self) -> Duration {
        Duration::from_secs(self.table_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_attempts, Duration::from_secs(self.retry_delay_secs))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Above this many paths, summaries run on a fixed-stride subsample
    pub max_samples: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig { max_samples: 60_000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
    pub capacity: usize,
    /// Where downloaded tables are kept; `None` means the user cache dir
    pub dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            ttl_secs: 3600,
            capacity: 1024,
            dir: None,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn cache_dir(&self) -> PathBuf {
        match &self.dir {
            Some(dir) => dir.clone(),
            None => dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("bgp-route-bot"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"route_server": {"port": 2323}, "analysis": {"max_samples": 10}}"#)
                .unwrap();
        assert_eq!(config.route_server.port, 2323);
        assert_eq!(config.route_server.host, "route-server.he.net");
        assert_eq!(config.route_server.command_timeout(), Duration::from_secs(220));
        assert_eq!(config.analysis.max_samples, 10);
        assert_eq!(config.cache.ttl_secs, 3600);
    }

    #[test]
    fn test_validate_rejects_zero_samples() {
        let config = Config::default().with_max_samples(0);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_default_retry_policy() {
        let policy = RouteServerConfig::default().retry_policy();
        assert_eq!(policy.attempts, 3);
        assert_eq!(policy.delay, Duration::from_secs(2));
    }
}
