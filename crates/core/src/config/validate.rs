use super::{
    types::{AuthMethod, Config},
    ConfigError,
};

/// Validate configuration
/// Currently validates:
/// - Backend section exists (enforced by serde) and its identifiers are set
/// - Server port and backend timeout are not 0
/// - `api_key` auth carries a non-empty key
/// - Catalog limits and thumbnail dimensions are usable
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let backend = &config.backend;
    if !(backend.endpoint.starts_with("http://") || backend.endpoint.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "backend.endpoint must be an http(s) URL, got '{}'",
            backend.endpoint
        )));
    }

    if backend.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "backend.timeout_secs cannot be 0".to_string(),
        ));
    }

    for (name, value) in [
        ("backend.project_id", &backend.project_id),
        ("backend.database_id", &backend.database_id),
        ("backend.books_collection_id", &backend.books_collection_id),
        ("backend.storage_bucket_id", &backend.storage_bucket_id),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "{} cannot be empty",
                name
            )));
        }
    }

    if config.auth.method == AuthMethod::ApiKey
        && config.auth.api_key.as_deref().is_none_or(|k| k.trim().is_empty())
    {
        return Err(ConfigError::ValidationError(
            "auth.api_key must be set when auth.method = \"api_key\"".to_string(),
        ));
    }

    if config.catalog.page_size == 0 {
        return Err(ConfigError::ValidationError(
            "catalog.page_size cannot be 0".to_string(),
        ));
    }

    let thumbs = &config.thumbnails;
    if thumbs.width == 0 || thumbs.height == 0 {
        return Err(ConfigError::ValidationError(
            "thumbnails.width and thumbnails.height must be positive".to_string(),
        ));
    }
    if !(1..=100).contains(&thumbs.quality) {
        return Err(ConfigError::ValidationError(format!(
            "thumbnails.quality must be between 1 and 100, got {}",
            thumbs.quality
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    fn valid_config() -> Config {
        load_config_from_str(
            r#"
[backend]
endpoint = "https://cloud.example.com/v1"
project_id = "proj"
database_id = "db"
books_collection_id = "books"
storage_bucket_id = "bucket"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = valid_config();
        config.server.port = 0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_bad_endpoint_fails() {
        let mut config = valid_config();
        config.backend.endpoint = "cloud.example.com".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_empty_bucket_fails() {
        let mut config = valid_config();
        config.backend.storage_bucket_id = "  ".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("storage_bucket_id"));
    }

    #[test]
    fn test_validate_thumbnail_quality() {
        let mut config = valid_config();
        config.thumbnails.quality = 0;
        assert!(validate_config(&config).is_err());

        config.thumbnails.quality = 100;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_zero_timeout_fails() {
        let mut config = valid_config();
        config.backend.timeout_secs = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));

        config.backend.timeout_secs = 1;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_api_key_auth_requires_key() {
        let mut config = valid_config();
        config.auth.method = AuthMethod::ApiKey;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("auth.api_key"));

        config.auth.api_key = Some(" ".to_string());
        assert!(validate_config(&config).is_err());

        config.auth.api_key = Some("librarian-key".to_string());
        assert!(validate_config(&config).is_ok());
    }
}
