use crate::config::types::ScanConfig;
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
/// * `Ok(ScanConfig)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use recon_scan::config::load_config;
///
/// let config = load_config(Path::new("scan.toml")).unwrap();
/// println!("Max depth: {}", config.scan.max_depth);
/// ```
pub fn load_config(path: &Path) -> Result<ScanConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses, normalizes and validates configuration from a TOML string
pub fn parse_config(content: &str) -> Result<ScanConfig, ConfigError> {
    let mut config: ScanConfig = toml::from_str(content)?;
    config.normalize();
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at the start of a run so that reports can be tied back to the
/// exact configuration that produced them.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(ScanConfig, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScopeMode;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[scan]
start-url = "https://example.com/"
scope = "external-once"
max-depth = 2
workers = 4
max-requests = 200

[filters]
deny-domains = ["ads.example.com"]
deny-extensions = ["png", ".JPG"]
danger-substrings = ["delete"]
status-filters = [404]

[output]
csv-path = "./report.csv"
show-duplicates = true

[[sensitive]]
name = "internal_ticket"
regex = "TICKET-[0-9]+"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.scan.scope, ScopeMode::ExternalOnce);
        assert_eq!(config.scan.max_depth, 2);
        assert_eq!(config.scan.workers, 4);
        assert_eq!(config.scan.max_requests, Some(200));
        assert_eq!(config.filters.deny_extensions, vec![".png", ".jpg"]);
        assert_eq!(config.output.csv_path.as_deref(), Some("./report.csv"));
        assert!(config.output.show_duplicates);
        assert_eq!(config.sensitive.len(), 1);
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse_config("[scan]\nstart-url = \"http://example.com\"\n").unwrap();

        assert_eq!(config.scan.scope, ScopeMode::MainDomainOnly);
        assert_eq!(config.scan.workers, 10);
        assert_eq!(config.dedup.expected_urls, 1_000_000);
        assert!(!config.filters.danger_substrings.is_empty());
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/scan.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[scan]
start-url = "https://example.com/"
workers = 0
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
