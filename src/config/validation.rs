use std::{collections::HashSet, net::SocketAddr};

use http::HeaderName;

use crate::{
    config::models::{AdapterConfig, RouteEntry},
    core::HttpMethod,
};

/// Validation result type alias
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validation error types
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Invalid listen address '{address}': {reason}")]
    InvalidListenAddress { address: String, reason: String },

    #[error("Route conflict detected: {message}")]
    RouteConflict { message: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },
}

/// Adapter configuration validator
pub struct AdapterConfigValidator;

impl AdapterConfigValidator {
    /// Validate the entire adapter configuration, reporting every problem at once
    pub fn validate(config: &AdapterConfig) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if config.name.trim().is_empty() {
            errors.push(ValidationError::MissingField {
                field: "name".to_string(),
            });
        }

        if let Err(e) = Self::validate_listen_address(&config.listen_addr) {
            errors.push(e);
        }

        for (field, value) in [
            ("exit_code_header", &config.exit_code_header),
            ("request_id_header", &config.request_id_header),
        ] {
            if let Err(e) = Self::validate_header_name(field, value) {
                errors.push(e);
            }
        }

        if config.body_limit_bytes == 0 {
            errors.push(ValidationError::InvalidField {
                field: "body_limit_bytes".to_string(),
                message: "Must be greater than zero".to_string(),
            });
        }

        for route in &config.routes {
            errors.extend(Self::validate_route(route));
        }
        errors.extend(Self::check_route_conflicts(&config.routes));

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::ValidationFailed {
                message: Self::format_multiple_errors(errors),
            })
        }
    }

    /// Validate listen address format
    fn validate_listen_address(address: &str) -> ValidationResult<()> {
        if address.parse::<SocketAddr>().is_err() {
            return Err(ValidationError::InvalidListenAddress {
                address: address.to_string(),
                reason: "Must be in format 'IP:PORT' (e.g., '127.0.0.1:3000' or '0.0.0.0:8080')"
                    .to_string(),
            });
        }
        Ok(())
    }

    fn validate_header_name(field: &str, value: &str) -> ValidationResult<()> {
        HeaderName::try_from(value)
            .map(|_| ())
            .map_err(|e| ValidationError::InvalidField {
                field: field.to_string(),
                message: format!("'{value}' is not a valid header name: {e}"),
            })
    }

    fn validate_route(route: &RouteEntry) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if !route.url.starts_with('/') {
            errors.push(ValidationError::InvalidField {
                field: format!("route url: {}", route.url),
                message: "Route urls must start with '/'".to_string(),
            });
        }
        if route.methods.is_empty() {
            errors.push(ValidationError::InvalidField {
                field: format!("route '{}' methods", route.url),
                message: "At least one method is required".to_string(),
            });
        }
        if route.methods.contains(&HttpMethod::Search) {
            tracing::warn!(
                url = %route.url,
                "Route declares 'search', which the transport cannot bind; it will be skipped"
            );
        }

        errors
    }

    /// The same url and method declared twice can only ever serve the first
    /// declaration.
    fn check_route_conflicts(routes: &[RouteEntry]) -> Vec<ValidationError> {
        let mut seen = HashSet::new();
        routes
            .iter()
            .flat_map(|route| route.methods.iter().map(move |method| (route.url.as_str(), *method)))
            .filter(|pair| !seen.insert(*pair))
            .map(|(url, method)| ValidationError::RouteConflict {
                message: format!("'{method} {url}' is declared more than once"),
            })
            .collect()
    }

    /// Format multiple validation errors into a readable message
    fn format_multiple_errors(errors: Vec<ValidationError>) -> String {
        let mut message = format!("Found {} validation error(s):\n", errors.len());
        for (i, error) in errors.iter().enumerate() {
            message.push_str(&format!("  {}. {}\n", i + 1, error));
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(AdapterConfigValidator::validate(&AdapterConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_listen_address() {
        let config = AdapterConfig::builder().listen_addr("localhost").build();
        let err = AdapterConfigValidator::validate(&config).unwrap_err();
        assert!(err.to_string().contains("Invalid listen address 'localhost'"));
    }

    #[test]
    fn test_all_errors_are_reported_together() {
        let config = AdapterConfig::builder()
            .name("")
            .exit_code_header("bad header")
            .body_limit_bytes(0)
            .route("users", Vec::new())
            .build();

        let ValidationError::ValidationFailed { message } =
            AdapterConfigValidator::validate(&config).unwrap_err()
        else {
            panic!("expected aggregated error");
        };
        assert!(message.starts_with("Found 5 validation error(s)"));
        assert!(message.contains("Missing required field: name"));
        assert!(message.contains("exit_code_header"));
        assert!(message.contains("body_limit_bytes"));
        assert!(message.contains("must start with '/'"));
        assert!(message.contains("At least one method"));
    }

    #[test]
    fn test_duplicate_route_method_is_a_conflict() {
        let config = AdapterConfig::builder()
            .route("/a", [HttpMethod::Get])
            .route("/a", [HttpMethod::Post, HttpMethod::Get])
            .build();

        let err = AdapterConfigValidator::validate(&config).unwrap_err();
        assert!(err.to_string().contains("'get /a' is declared more than once"));
    }

    #[test]
    fn test_search_only_warns() {
        let config = AdapterConfig::builder()
            .route("/find", [HttpMethod::Search])
            .build();
        assert!(AdapterConfigValidator::validate(&config).is_ok());
    }
}
