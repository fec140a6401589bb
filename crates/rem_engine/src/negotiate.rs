//! Builds the constructor payload for whatever pipeline version is installed.

use std::collections::BTreeSet;

use rem_logging::rem_warn;

use crate::{ConfigurationError, ParamValue, Payload, PipelineEntryPoint};

/// Parameter names an entry point accepts, derived once per run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CapabilityDescriptor {
    accepted: BTreeSet<String>,
    opaque: bool,
}

impl CapabilityDescriptor {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            accepted: names.into_iter().map(Into::into).collect(),
            opaque: false,
        }
    }

    /// Descriptor for an entry point whose signature could not be read.
    ///
    /// Nothing is known to be supported, but required parameters are still
    /// passed through since the pipeline cannot run without them.
    pub fn opaque() -> Self {
        Self {
            accepted: BTreeSet::new(),
            opaque: true,
        }
    }

    pub fn introspect(entry_point: &dyn PipelineEntryPoint) -> Self {
        match entry_point.accepted_parameters() {
            Ok(names) => Self::from_names(names),
            Err(err) => {
                rem_warn!(
                    "could not introspect parameters of {}: {err:#}",
                    entry_point.name()
                );
                Self::opaque()
            }
        }
    }

    pub fn supports(&self, name: &str) -> bool {
        self.accepted.contains(name)
    }

    pub fn is_opaque(&self) -> bool {
        self.opaque
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptionalParam {
    pub name: String,
    pub value: ParamValue,
    /// Shown alongside the warning when this parameter has to be dropped.
    pub hint: Option<String>,
}

impl OptionalParam {
    pub fn new(name: impl Into<String>, value: ParamValue) -> Self {
        Self {
            name: name.into(),
            value,
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DesiredParameters {
    pub required: Vec<(String, ParamValue)>,
    pub optional: Vec<OptionalParam>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Negotiation {
    pub payload: Payload,
    /// One entry per dropped optional parameter, in the order they were offered.
    pub warnings: Vec<String>,
}

impl Negotiation {
    pub fn dropped(&self) -> usize {
        self.warnings.len()
    }
}

/// Keeps every required parameter and each optional one the target accepts.
///
/// Pure: the same descriptor and desired set always give the same result.
pub fn negotiate(
    capabilities: &CapabilityDescriptor,
    desired: &DesiredParameters,
) -> Result<Negotiation, ConfigurationError> {
    let mut payload = Payload::new();

    for (name, value) in &desired.required {
        if !capabilities.is_opaque() && !capabilities.supports(name) {
            return Err(ConfigurationError::UnsupportedRequired(name.clone()));
        }
        payload.insert(name.clone(), value.clone());
    }

    let mut warnings = Vec::new();
    for param in &desired.optional {
        if payload.contains_key(&param.name) {
            continue;
        }
        if capabilities.supports(&param.name) {
            payload.insert(param.name.clone(), param.value.clone());
        } else {
            let mut warning = format!(
                "Warning: parameter `{}` is not supported by this pipeline version and was dropped",
                param.name
            );
            if let Some(hint) = &param.hint {
                warning.push_str(" (");
                warning.push_str(hint);
                warning.push(')');
            }
            warnings.push(warning);
        }
    }

    Ok(Negotiation { payload, warnings })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_descriptor_passes_required_only() {
        let desired = DesiredParameters {
            required: vec![("dem".into(), ParamValue::Text("a".into()))],
            optional: vec![OptionalParam::new("eps", ParamValue::Float(0.1))],
        };
        let result = negotiate(&CapabilityDescriptor::opaque(), &desired).unwrap();
        assert_eq!(result.payload.len(), 1);
        assert!(result.payload.contains_key("dem"));
        assert_eq!(result.dropped(), 1);
    }

    #[test]
    fn hint_is_appended_to_warning() {
        let desired = DesiredParameters {
            required: vec![],
            optional: vec![OptionalParam::new("centerline_shp", ParamValue::Unset)
                .with_hint("upgrade")],
        };
        let result = negotiate(&CapabilityDescriptor::default(), &desired).unwrap();
        assert!(result.warnings[0].contains("`centerline_shp`"));
        assert!(result.warnings[0].ends_with("(upgrade)"));
    }
}
