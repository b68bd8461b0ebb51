use crate::server::{SiteSettings, cache::DEFAULT_CAPACITY};
use lectern_common::pagination::{DEFAULT_PAGE_SIZE, Paginator};
use serde::Deserialize;
use std::{
    net::{IpAddr, SocketAddr},
    num::{NonZeroU64, NonZeroUsize},
    time::Duration,
};

pub const ENV_PREFIX: &str = "LECTERN_";

/// Read from `LECTERN_`-prefixed environment variables.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
pub struct Config {
    pub server_address: IpAddr,
    pub server_port: u16,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_page_size")]
    pub page_size: NonZeroU64,
    #[serde(default = "default_index_cache_ttl_seconds")]
    pub index_cache_ttl_seconds: u64,
    #[serde(default = "default_index_cache_capacity")]
    pub index_cache_capacity: NonZeroUsize,
    #[serde(default = "default_login_url")]
    pub login_url: String,
}

fn default_database_url() -> String {
    "sqlite://lectern.db?mode=rwc".to_owned()
}

fn default_page_size() -> NonZeroU64 {
    DEFAULT_PAGE_SIZE
}

fn default_index_cache_ttl_seconds() -> u64 {
    20
}

fn default_index_cache_capacity() -> NonZeroUsize {
    DEFAULT_CAPACITY
}

fn default_login_url() -> String {
    "/auth/login/".to_owned()
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed(ENV_PREFIX).from_env()
    }

    #[must_use]
    pub fn socket_address(&self) -> SocketAddr {
        SocketAddr::new(self.server_address, self.server_port)
    }

    #[must_use]
    pub fn site_settings(&self) -> SiteSettings {
        SiteSettings {
            paginator: Paginator::new(self.page_size),
            index_cache_ttl: Duration::from_secs(self.index_cache_ttl_seconds),
            index_cache_capacity: self.index_cache_capacity,
            login_url: self.login_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{Config, ENV_PREFIX};
    use std::time::Duration;

    fn parse(vars: &[(&str, &str)]) -> Result<Config, envy::Error> {
        let vars = vars
            .iter()
            .map(|(key, value)| (format!("{ENV_PREFIX}{key}"), (*value).to_owned()));
        envy::prefixed(ENV_PREFIX).from_iter(vars)
    }

    #[test]
    fn defaults_apply() {
        let config = parse(&[("SERVER_ADDRESS", "127.0.0.1"), ("SERVER_PORT", "8000")]).unwrap();

        assert_eq!(config.socket_address().to_string(), "127.0.0.1:8000");
        assert_eq!(config.database_url, "sqlite://lectern.db?mode=rwc");

        let site = config.site_settings();
        assert_eq!(site.paginator.page_size(), 10);
        assert_eq!(site.index_cache_ttl, Duration::from_secs(20));
        assert_eq!(site.index_cache_capacity.get(), 128);
        assert_eq!(site.login_url, "/auth/login/");
    }

    #[test]
    fn overrides_apply() {
        let config = parse(&[
            ("SERVER_ADDRESS", "0.0.0.0"),
            ("SERVER_PORT", "80"),
            ("PAGE_SIZE", "25"),
            ("INDEX_CACHE_TTL_SECONDS", "5"),
            ("INDEX_CACHE_CAPACITY", "16"),
            ("LOGIN_URL", "/login/"),
        ])
        .unwrap();

        let site = config.site_settings();
        assert_eq!(site.paginator.page_size(), 25);
        assert_eq!(site.index_cache_ttl, Duration::from_secs(5));
        assert_eq!(site.index_cache_capacity.get(), 16);
        assert_eq!(site.login_url, "/login/");
    }

    #[test]
    fn zero_cache_capacity_is_rejected() {
        assert!(
            parse(&[
                ("SERVER_ADDRESS", "127.0.0.1"),
                ("SERVER_PORT", "8000"),
                ("INDEX_CACHE_CAPACITY", "0"),
            ])
            .is_err()
        );
    }

    #[test]
    fn zero_page_size_is_rejected() {
        assert!(
            parse(&[
                ("SERVER_ADDRESS", "127.0.0.1"),
                ("SERVER_PORT", "8000"),
                ("PAGE_SIZE", "0"),
            ])
            .is_err()
        );
    }
}
