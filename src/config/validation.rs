//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check target addresses parse and names are unique
//! - Validate value ranges (thresholds > 0, period > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BalancerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::fmt;

use crate::config::schema::BalancerConfig;
use crate::load_balancer::Target;

/// A single semantic problem in a config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &BalancerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut names = HashSet::new();
    for (i, target) in config.pool.targets.iter().enumerate() {
        let field = format!("pool.targets[{}]", i);
        if let Err(e) = Target::parse(&target.address) {
            errors.push(ValidationError::new(format!("{}.address", field), e.to_string()));
        }
        if target.weight < 0 {
            errors.push(ValidationError::new(
                format!("{}.weight", field),
                "must not be negative",
            ));
        }
        if let Some(name) = &target.name {
            if !names.insert(name.as_str()) {
                errors.push(ValidationError::new(
                    format!("{}.name", field),
                    format!("duplicate target name '{}'", name),
                ));
            }
        }
    }

    let hc = &config.health_check;
    if hc.period_secs == 0 {
        errors.push(ValidationError::new("health_check.period_secs", "must be at least 1"));
    }
    if hc.timeout_secs == 0 {
        errors.push(ValidationError::new("health_check.timeout_secs", "must be at least 1"));
    }
    if hc.success_threshold == 0 {
        errors.push(ValidationError::new("health_check.success_threshold", "must be at least 1"));
    }
    if hc.failure_threshold == 0 {
        errors.push(ValidationError::new("health_check.failure_threshold", "must be at least 1"));
    }

    if config.admin.enabled {
        if config.admin.api_key.is_empty() {
            errors.push(ValidationError::new("admin.api_key", "required when admin is enabled"));
        }
        if config.admin.bind_address.parse::<std::net::SocketAddr>().is_err() {
            errors.push(ValidationError::new("admin.bind_address", "not a socket address"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::TargetConfig;

    fn target(address: &str, name: Option<&str>, weight: i32) -> TargetConfig {
        TargetConfig {
            address: address.to_string(),
            name: name.map(str::to_string),
            weight,
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&BalancerConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = BalancerConfig::default();
        config.pool.targets = vec![
            target("http://10.0.0.1", Some("a"), 1),
            target("nonsense", Some("a"), -2),
        ];
        config.health_check.period_secs = 0;
        config.health_check.failure_threshold = 0;
        config.admin.enabled = true;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "pool.targets[1].address",
                "pool.targets[1].weight",
                "pool.targets[1].name",
                "health_check.period_secs",
                "health_check.failure_threshold",
                "admin.api_key",
            ]
        );
    }

    #[test]
    fn test_zero_weight_is_allowed() {
        let mut config = BalancerConfig::default();
        config.pool.targets = vec![target("http://10.0.0.1", None, 0)];
        assert!(validate_config(&config).is_ok());
    }
}
