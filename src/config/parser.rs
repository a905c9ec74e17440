use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use catalog_ripple::config::load_config;
///
/// let config = load_config(Path::new("config.toml")).unwrap();
/// println!("Origin: {}", config.scraper.origin);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackoffPolicy;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_full_config() {
        let config_content = r#"
[scraper]
origin = "https://books.toscrape.com/"
total-pages = 5
max-attempts = 4
retry-delay-ms = 250
backoff = "exponential"

[scheduler]
max-concurrent-tasks = 2
requests-per-window = 3
window-ms = 1000

[proxy]
use-proxy = true

[[proxy.servers]]
host = "10.0.0.1"
port = 8080
username = "alice"
password = "secret"

[[proxy.servers]]
host = "10.0.0.2"
port = 3128

[output]
json-path = "out/products.json"
csv-path = "out/products.csv"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.scraper.total_pages, 5);
        assert_eq!(config.scraper.max_attempts, 4);
        assert_eq!(config.scraper.backoff, BackoffPolicy::Exponential);
        assert_eq!(config.scheduler.max_concurrent_tasks, 2);
        assert_eq!(config.scheduler.requests_per_window, 3);
        assert!(config.proxy.use_proxy);
        assert_eq!(config.proxy.servers.len(), 2);
        assert_eq!(
            config.proxy.servers[0].credentials(),
            Some(("alice", "secret"))
        );
        assert_eq!(config.proxy.servers[1].credentials(), None);
        assert_eq!(config.output.csv_path, "out/products.csv");
    }

    #[test]
    fn test_defaults_match_observed_policy() {
        let config = parse_config(
            r#"
[scraper]
origin = "https://books.toscrape.com/"
total-pages = 3
"#,
        )
        .unwrap();

        assert_eq!(config.scraper.max_attempts, 3);
        assert_eq!(config.scraper.retry_delay_ms, 1000);
        assert_eq!(config.scraper.backoff, BackoffPolicy::Fixed);
        assert_eq!(config.scheduler.max_concurrent_tasks, 1);
        assert_eq!(config.scheduler.requests_per_window, 1);
        assert_eq!(config.scheduler.window_ms, 800);
        assert!(!config.proxy.use_proxy);
        assert!(config.proxy.servers.is_empty());
        assert_eq!(config.output.json_path, "products.json");
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_malformed_proxy_is_fatal() {
        let result = parse_config(
            r#"
[scraper]
origin = "https://books.toscrape.com/"
total-pages = 3

[[proxy.servers]]
host = ""
port = 8080
"#,
        );
        assert!(matches!(result, Err(ConfigError::InvalidProxy { .. })));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }
}
