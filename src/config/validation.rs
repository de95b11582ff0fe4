use crate::config::types::{Config, CrawlerConfig, OutputConfig, SearchConfig, UserAgentConfig};
use crate::url::parse_page_url;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_search_config(&config.search)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > 64 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 64, got {}",
            config.workers
        )));
    }

    if config.max_concurrent_search_pages < 1 || config.max_concurrent_search_pages > 16 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_search_pages must be between 1 and 16, got {}",
            config.max_concurrent_search_pages
        )));
    }

    if config.channel_capacity < 1 {
        return Err(ConfigError::Validation(format!(
            "channel_capacity must be >= 1, got {}",
            config.channel_capacity
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.json_path.is_empty() {
        return Err(ConfigError::Validation(
            "json_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the seed list
///
/// A seed that does not parse is fatal: without it no frontier can be built.
fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    if config.seeds.is_empty() {
        return Err(ConfigError::InvalidUrl(
            "at least one search seed URL is required".to_string(),
        ));
    }

    for seed in &config.seeds {
        parse_page_url(seed).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e))
        })?;
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    // Basic email format check: must contain @ and have text on both sides
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    let local = parts[0];
    let domain = parts[1];

    if local.is_empty() || domain.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search(seeds: &[&str]) -> SearchConfig {
        SearchConfig {
            seeds: seeds.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_validate_seeds() {
        assert!(validate_search_config(&search(&["https://www.trademe.co.nz/browse"])).is_ok());
        assert!(validate_search_config(&search(&["http://127.0.0.1:8080/search?page=1"])).is_ok());

        assert!(validate_search_config(&search(&[])).is_err());
        assert!(validate_search_config(&search(&["/relative/path"])).is_err());
        assert!(validate_search_config(&search(&["ftp://example.com/file"])).is_err());
        assert!(validate_search_config(&search(&["mailto:someone@example.com"])).is_err());
    }

    #[test]
    fn test_seed_rules_match_crawler_parsing() {
        // Accepted here means the crawler can queue it
        let padded = "  https://www.trademe.co.nz/browse?page=1 ";
        assert!(validate_search_config(&search(&[padded])).is_ok());
        assert!(parse_page_url(padded).is_ok());

        for bad in ["ftp://example.com/file", "not a url", "data:text/plain,hi"] {
            assert!(parse_page_url(bad).is_err());
            assert!(matches!(
                validate_search_config(&search(&[bad])),
                Err(ConfigError::InvalidUrl(_))
            ));
        }
    }

    #[test]
    fn test_validate_crawler_bounds() {
        let mut crawler = CrawlerConfig {
            workers: 5,
            max_concurrent_search_pages: 2,
            channel_capacity: 10,
            request_timeout_secs: 30,
        };
        assert!(validate_crawler_config(&crawler).is_ok());

        crawler.workers = 65;
        assert!(validate_crawler_config(&crawler).is_err());

        crawler.workers = 5;
        crawler.channel_capacity = 0;
        assert!(validate_crawler_config(&crawler).is_err());

        crawler.channel_capacity = 10;
        crawler.max_concurrent_search_pages = 0;
        assert!(validate_crawler_config(&crawler).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("admin@sub.example.com").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@domain").is_err());
    }
}
