//! The scrubbed process environment, attached as `process.environ`.

use pc_common::{AttributeKey, AttributeSink, AttributeValue};
use pc_redact::Scrubber;
use std::collections::BTreeMap;

/// A scrubbed snapshot of environment variables, computed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentResource {
    value: String,
}

impl EnvironmentResource {
    /// Scrub `vars`, sorted by name.
    pub fn from_vars<I, K, V>(scrubber: &Scrubber, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let sorted: BTreeMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            value: scrubber.scrub(&sorted),
        }
    }

    /// Snapshot the current process environment.
    ///
    /// Names and values that are not valid Unicode are converted lossily.
    pub fn from_process(scrubber: &Scrubber) -> Self {
        let vars = std::env::vars_os().map(|(k, v)| {
            (
                k.to_string_lossy().into_owned(),
                v.to_string_lossy().into_owned(),
            )
        });
        let resource = Self::from_vars(scrubber, vars);
        tracing::debug!(len = resource.value.len(), "process environment captured");
        resource
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn attach(&self, sink: &dyn AttributeSink) {
        sink.set_attribute(
            AttributeKey::ProcessEnvironment,
            AttributeValue::Text(self.value.clone()),
        );
    }
}
