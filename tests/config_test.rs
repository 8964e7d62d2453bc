use std::env;
use std::fs;
use tempfile::tempdir;

#[cfg(test)]
mod config_tests {
    use super::*;
    use querylog_analyzer::config::{Config, ScopeChoice};
    use querylog_analyzer::{Scope, Window};

    #[test]
    fn test_default_config_values() {
        let config = Config::default();

        // Test logging defaults
        assert_eq!(config.logging.level, "WARN");
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.logging.output, "console");

        // Test analysis defaults
        assert_eq!(config.analysis.window, Window::Full);
        assert_eq!(config.analysis.scope, ScopeChoice::All);
        assert_eq!(config.analysis.target_ip, None);
        assert_eq!(config.analysis.date, None);

        // Test path defaults
        assert_eq!(config.paths.log_file.to_str(), Some("querylog.json"));
        assert_eq!(config.paths.cache_file.to_str(), Some("parsed_log_cache.json"));

        // Test collaborators
        assert!(config.cache.enabled);
        assert!(!config.delivery.enabled);
        assert_eq!(config.delivery.timeout_secs, 60);
    }

    #[test]
    fn test_env_variable_override() {
        // Set environment variables
        env::set_var("ANALYSIS_TIME_CHOICE", "1");
        env::set_var("ANALYSIS_IP_CHOICE", "1");
        env::set_var("ANALYSIS_TARGET_IP", "192.168.1.20");
        env::set_var("ANALYSIS_DATE", "2024-05-01");
        env::set_var("LOG_LEVEL", "DEBUG");
        env::set_var("QUERYLOG_PATH", "/var/lib/adguard/querylog.json");
        env::set_var("QUERYLOG_CACHE_ENABLED", "false");
        env::set_var("QUERYLOG_DELIVERY_URL", "https://storage.example/reports");

        let mut config = Config::default();
        let result = config.apply_env_overrides();

        // Cleanup before asserting so a failure leaves nothing behind
        for key in [
            "ANALYSIS_TIME_CHOICE",
            "ANALYSIS_IP_CHOICE",
            "ANALYSIS_TARGET_IP",
            "ANALYSIS_DATE",
            "LOG_LEVEL",
            "QUERYLOG_PATH",
            "QUERYLOG_CACHE_ENABLED",
            "QUERYLOG_DELIVERY_URL",
        ] {
            env::remove_var(key);
        }
        result.expect("Failed to apply env overrides");

        assert_eq!(config.logging.level, "DEBUG");
        assert_eq!(config.paths.log_file.to_str(), Some("/var/lib/adguard/querylog.json"));
        assert!(!config.cache.enabled);
        assert!(config.delivery.enabled);
        assert_eq!(config.delivery.endpoint, "https://storage.example/reports");

        let options = config.analysis_options().expect("Failed to resolve options");
        assert_eq!(options.window, Window::Peak);
        assert_eq!(options.scope, Scope::SingleEntity("192.168.1.20".to_string()));
        assert_eq!(options.pinned_date, chrono::NaiveDate::from_ymd_opt(2024, 5, 1));
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        // Test valid config
        assert!(config.validate().is_ok());

        // Single client without a target
        config.analysis.scope = ScopeChoice::Single;
        assert!(config.validate().is_err());
        config.analysis.target_ip = Some("  ".to_string());
        assert!(config.validate().is_err());

        // Delivery without a usable endpoint
        config = Config::default();
        config.delivery.enabled = true;
        assert!(config.validate().is_err());
        config.delivery.endpoint = "https://storage.example/reports".to_string();
        assert!(config.validate().is_ok());

        config.delivery.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_file_loading() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("test-config.toml");

        // Sections left out keep their defaults
        let test_config = r#"
[logging]
level = "DEBUG"
format = "json"
output = "file"

[analysis]
window = "peak"
scope = "single"
target_ip = "10.0.0.5"
date = "2024-05-01"

[paths]
log_file = "/opt/adguard/data/querylog.json"
output_dir = "/srv/reports"
cache_file = "/tmp/querylog-cache.json"
log_directory = "/var/log/querylog-analyzer"
        "#;

        fs::write(&config_path, test_config).expect("Failed to write test config");

        // Load config from file
        let config = Config::load_from_file(&config_path).expect("Failed to load config");

        // Verify loaded values
        assert_eq!(config.logging.level, "DEBUG");
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.analysis.window, Window::Peak);
        assert_eq!(config.analysis.scope, ScopeChoice::Single);
        assert_eq!(config.paths.output_dir.to_str(), Some("/srv/reports"));
        assert!(config.cache.enabled);
        assert!(!config.delivery.enabled);

        let options = config.analysis_options().expect("Failed to resolve options");
        assert_eq!(options.scope, Scope::SingleEntity("10.0.0.5".to_string()));
        assert_eq!(options.pinned_date, chrono::NaiveDate::from_ymd_opt(2024, 5, 1));
    }

    #[test]
    fn test_partial_sections_keep_field_defaults() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("partial.toml");
        fs::write(
            &config_path,
            "[analysis]\nwindow = \"peak\"\n\n[paths]\noutput_dir = \"/srv/reports\"\n\n[delivery]\nenabled = false\n",
        )
        .unwrap();

        let config = Config::load_from_file(&config_path).expect("Failed to load config");

        assert_eq!(config.analysis.window, Window::Peak);
        assert_eq!(config.analysis.scope, ScopeChoice::All);
        assert_eq!(config.paths.output_dir.to_str(), Some("/srv/reports"));
        assert_eq!(config.paths.log_file.to_str(), Some("querylog.json"));
        assert_eq!(config.paths.cache_file.to_str(), Some("parsed_log_cache.json"));
        assert_eq!(config.delivery.timeout_secs, 60);
        assert_eq!(config.logging.level, "WARN");
    }

    #[test]
    fn test_numeric_selectors_in_config_file() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("numeric.toml");
        fs::write(
            &config_path,
            "[analysis]\nwindow = 1\nscope = \"1\"\ntarget_ip = \"10.0.0.5\"\n",
        )
        .unwrap();

        let config = Config::load_from_file(&config_path).expect("Failed to load config");
        assert_eq!(config.analysis.window, Window::Peak);
        assert_eq!(config.analysis.scope, ScopeChoice::Single);

        fs::write(&config_path, "[analysis]\nwindow = \"2\"\nscope = 2\n").unwrap();
        let config = Config::load_from_file(&config_path).expect("Failed to load config");
        assert_eq!(config.analysis.window, Window::Full);
        assert_eq!(config.analysis.scope, ScopeChoice::All);

        fs::write(&config_path, "[analysis]\nscope = 3\n").unwrap();
        assert!(Config::load_from_file(&config_path).is_err());
    }

    #[test]
    fn test_config_serialization() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("saved.toml");
        let mut config = Config::default();
        config.analysis.window = Window::Peak;

        config.save_to_file(&config_path).expect("Failed to save config");
        let toml_string = fs::read_to_string(&config_path).expect("Failed to read config");
        assert!(toml_string.contains("[logging]"));
        assert!(toml_string.contains("[analysis]"));
        assert!(toml_string.contains("[paths]"));
        assert!(toml_string.contains("[cache]"));
        assert!(toml_string.contains("[delivery]"));

        // Test round-trip
        let deserialized = Config::load_from_file(&config_path).expect("Failed to reload config");
        assert_eq!(deserialized.logging.level, config.logging.level);
        assert_eq!(deserialized.analysis.window, Window::Peak);
        assert_eq!(deserialized.paths.cache_file, config.paths.cache_file);
    }

    #[test]
    fn test_invalid_config_file_is_reported() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("broken.toml");
        fs::write(&config_path, "[analysis]\nwindow = \"evening\"\n").unwrap();

        let err = Config::load_from_file(&config_path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
