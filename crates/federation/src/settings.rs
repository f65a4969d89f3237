//! Runtime settings of the federation engine.

use std::time::Duration;

/// Upper bound on concurrent backend requests per query.
pub const MAX_WORKERS: usize = 32;

/// Settings shared by the orchestrator, the lifecycle service and the
/// providers bootstrap.
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    /// External base URL of the gateway, used for self, next and redirect links.
    pub base_url: String,

    /// Timeout of one backend HTTP request.
    pub backend_timeout: Duration,

    /// Interval at which a waiting search polls its query.
    pub poll_interval: Duration,

    /// `page_limit` assumed when the client sets none.
    pub default_page_limit: usize,

    /// Safety bound on pages fetched by the pagination walker.
    pub max_pagination_pages: Option<usize>,

    /// Upper bound on concurrent backend requests per query.
    pub max_workers: usize,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            backend_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_millis(200),
            default_page_limit: 20,
            max_pagination_pages: None,
            max_workers: MAX_WORKERS,
        }
    }
}

impl GatewaySettings {
    /// The base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Number of workers for a fan-out over `num_databases` backends:
    /// `min(max_workers, cpu_count + 4, num_databases)`, at least one.
    pub fn worker_count(&self, num_databases: usize) -> usize {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        self.max_workers.min(cpus + 4).min(num_databases).max(1)
    }

    /// Fast settings for tests.
    pub fn for_testing() -> Self {
        Self {
            backend_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(10),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_count_bounds() {
        let settings = GatewaySettings::default();
        assert_eq!(settings.worker_count(0), 1);
        assert_eq!(settings.worker_count(1), 1);
        assert!(settings.worker_count(1000) <= MAX_WORKERS);
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let settings = GatewaySettings {
            base_url: "https://gateway.example.org/".to_string(),
            ..GatewaySettings::default()
        };
        assert_eq!(settings.base_url(), "https://gateway.example.org");
    }
}
