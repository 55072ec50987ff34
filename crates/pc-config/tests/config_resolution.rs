//! Integration tests for pc-config.
//!
//! These tests verify:
//! - Environment-variable spelling of dotted keys is honoured
//! - The environment scope prefers its own key over the general key
//! - Bad budgets never abort resolution

use pc_config::{
    CaptureConfig, EnvProperties, MapProperties, PropertySource, SettingSource, ROW_MAX_LENGTH,
    SECRET_MASKING_REGEX, SECRET_MASKING_REGEX_ENVIRONMENT,
};

#[test]
fn test_env_properties_read_underscore_form() {
    // Only this test touches the process environment.
    std::env::set_var("LUMIGO_SECRET_MASKING_REGEX_ENVIRONMENT", "[\"db_.*\"]");

    let props = EnvProperties::new();
    assert_eq!(
        props.get(SECRET_MASKING_REGEX_ENVIRONMENT).as_deref(),
        Some("[\"db_.*\"]")
    );

    let config = CaptureConfig::from_env();
    assert_eq!(config.environment_masking.source, SettingSource::ScopeOverride);
    assert_eq!(config.environment_masking.raw, "[\"db_.*\"]");

    std::env::remove_var("LUMIGO_SECRET_MASKING_REGEX_ENVIRONMENT");
}

#[test]
fn test_general_scope_ignores_environment_override() {
    let props = MapProperties::new()
        .with(SECRET_MASKING_REGEX, "[\"general\"]")
        .with(SECRET_MASKING_REGEX_ENVIRONMENT, "all");

    let config = CaptureConfig::resolve(&props);
    assert_eq!(config.masking.raw, "[\"general\"]");
    assert_eq!(config.masking.source_key, SECRET_MASKING_REGEX);
    assert_eq!(config.environment_masking.raw, "all");
}

#[test]
fn test_default_config_is_unbounded_and_unconfigured() {
    let config = CaptureConfig::resolve(&MapProperties::new());
    assert_eq!(config, CaptureConfig::default());
    assert_eq!(config.row_max_length, usize::MAX);
}

#[test]
fn test_budget_with_whitespace() {
    let props = MapProperties::new().with(ROW_MAX_LENGTH, " 512\n");
    assert_eq!(CaptureConfig::resolve(&props).row_max_length, 512);
}
