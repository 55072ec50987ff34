//! The capture runtime: everything derived from configuration, built once at
//! startup and passed to the call sites that need it.

use crate::environment::EnvironmentResource;
use crate::rows::{ResultCapture, RowSerializer};
use pc_config::{CaptureConfig, MaskingSetting};
use pc_redact::{RuleParser, Scrubber};

#[derive(Debug, Clone)]
pub struct CaptureRuntime {
    config: CaptureConfig,
    scrubber: Scrubber,
    environment_scrubber: Scrubber,
    rows: RowSerializer,
    environment: EnvironmentResource,
}

impl CaptureRuntime {
    /// Build the runtime, snapshotting the current process environment.
    pub fn new(config: CaptureConfig) -> Self {
        let environment_scrubber = scrubber_for(&config.environment_masking);
        let environment = EnvironmentResource::from_process(&environment_scrubber);
        Self::assemble(config, environment_scrubber, environment)
    }

    /// Build the runtime over an explicit set of environment variables.
    pub fn with_environment<I, K, V>(config: CaptureConfig, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let environment_scrubber = scrubber_for(&config.environment_masking);
        let environment = EnvironmentResource::from_vars(&environment_scrubber, vars);
        Self::assemble(config, environment_scrubber, environment)
    }

    /// Resolve configuration from the process environment and build the runtime.
    pub fn from_env() -> Self {
        Self::new(CaptureConfig::from_env())
    }

    fn assemble(
        config: CaptureConfig,
        environment_scrubber: Scrubber,
        environment: EnvironmentResource,
    ) -> Self {
        Self {
            scrubber: scrubber_for(&config.masking),
            rows: RowSerializer::new(config.row_max_length),
            environment_scrubber,
            environment,
            config,
        }
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Scrubber for headers and other general key/value maps.
    pub fn scrubber(&self) -> &Scrubber {
        &self.scrubber
    }

    pub fn environment_scrubber(&self) -> &Scrubber {
        &self.environment_scrubber
    }

    pub fn row_serializer(&self) -> RowSerializer {
        self.rows
    }

    pub fn environment(&self) -> &EnvironmentResource {
        &self.environment
    }

    /// The scrubbed `process.environ` value.
    pub fn process_environment(&self) -> &str {
        self.environment.value()
    }

    pub fn new_result_capture(&self) -> ResultCapture {
        ResultCapture::new(self.rows)
    }

    /// Scrub a header map with the general rules.
    pub fn scrub_headers<I, K, V>(&self, headers: I) -> String
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.scrubber.scrub(headers)
    }
}

fn scrubber_for(setting: &MaskingSetting) -> Scrubber {
    Scrubber::new(RuleParser::masking().parse(&setting.source_key, setting.raw_value()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pc_config::{
        MapProperties, ROW_MAX_LENGTH, SECRET_MASKING_REGEX, SECRET_MASKING_REGEX_ENVIRONMENT,
    };
    use pc_redact::RedactionMode;

    #[test]
    fn test_environment_uses_its_own_override() {
        let props = MapProperties::new()
            .with(SECRET_MASKING_REGEX, r#"["^x-api-"]"#)
            .with(SECRET_MASKING_REGEX_ENVIRONMENT, "all");
        let runtime = CaptureRuntime::with_environment(
            CaptureConfig::resolve(&props),
            [("HOME", "/root")],
        );

        assert_eq!(runtime.process_environment(), "****");
        assert_eq!(runtime.scrubber().rules().mode(), RedactionMode::PatternList);
        assert_eq!(
            runtime.environment_scrubber().rules().source_key(),
            SECRET_MASKING_REGEX_ENVIRONMENT
        );
    }

    #[test]
    fn test_general_rules_apply_to_headers() {
        let props = MapProperties::new().with(SECRET_MASKING_REGEX, r#"["^x-api-"]"#);
        let runtime =
            CaptureRuntime::with_environment(CaptureConfig::resolve(&props), [("A", "b")]);

        let out = runtime.scrub_headers([("X-Api-Key", "s3cr3t"), ("Accept", "*/*")]);
        assert_eq!(out, r#"{\"X-Api-Key\":\"****\",\"Accept\":\"*/*\"}"#);
    }

    #[test]
    fn test_row_budget_is_threaded_through() {
        let props = MapProperties::new().with(ROW_MAX_LENGTH, "16");
        let runtime =
            CaptureRuntime::with_environment(CaptureConfig::resolve(&props), Vec::<(String, String)>::new());

        assert_eq!(runtime.row_serializer().max_length(), 16);
        assert_eq!(runtime.process_environment(), "{}");
        assert_eq!(runtime.new_result_capture().render(), "[]");
    }
}
