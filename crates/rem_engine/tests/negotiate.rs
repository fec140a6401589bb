mod support;

use std::path::PathBuf;

use pretty_assertions::assert_eq;
use rem_engine::{
    negotiate, CapabilityDescriptor, CenterlineSource, ConfigurationError, DesiredParameters,
    Neighbors, OptionalParam, ParamValue, Payload, RemParameters,
};
use support::FakeEntryPoint;

fn desired(required: &[(&str, i64)], optional: &[(&str, i64)]) -> DesiredParameters {
    DesiredParameters {
        required: required
            .iter()
            .map(|(name, value)| (name.to_string(), ParamValue::Int(*value)))
            .collect(),
        optional: optional
            .iter()
            .map(|(name, value)| OptionalParam::new(*name, ParamValue::Int(*value)))
            .collect(),
    }
}

#[test]
fn unsupported_optional_is_dropped_with_one_warning() {
    let caps = CapabilityDescriptor::from_names(["a", "b", "c"]);
    let result = negotiate(&caps, &desired(&[("a", 0), ("b", 0)], &[("c", 1), ("d", 2)])).unwrap();

    let mut expected = Payload::new();
    expected.insert("a".into(), ParamValue::Int(0));
    expected.insert("b".into(), ParamValue::Int(0));
    expected.insert("c".into(), ParamValue::Int(1));
    assert_eq!(result.payload, expected);
    assert_eq!(result.warnings.len(), 1);
    assert!(result.warnings[0].contains("`d`"));
}

#[test]
fn payload_keys_are_always_accepted_names() {
    let caps = CapabilityDescriptor::from_names(["dem", "out_dir", "k"]);
    let result = negotiate(&caps, &RemParameters::new("dem.tif", "out").desired()).unwrap();
    assert!(result.payload.keys().all(|key| caps.supports(key)));
    assert_eq!(result.payload.get("k"), Some(&ParamValue::Unset));
}

#[test]
fn missing_required_is_a_configuration_error() {
    let caps = CapabilityDescriptor::from_names(["a"]);
    let err = negotiate(&caps, &desired(&[("a", 0), ("b", 0)], &[])).unwrap_err();
    assert_eq!(err, ConfigurationError::UnsupportedRequired("b".to_string()));
}

#[test]
fn negotiation_is_deterministic() {
    let caps = CapabilityDescriptor::from_names(["a", "c"]);
    let wanted = desired(&[("a", 1)], &[("b", 2), ("c", 3)]);
    assert_eq!(negotiate(&caps, &wanted), negotiate(&caps, &wanted));
}

#[test]
fn failed_introspection_gives_an_opaque_descriptor() {
    rem_logging::initialize_for_tests();
    let caps = CapabilityDescriptor::introspect(&FakeEntryPoint::opaque());
    assert!(caps.is_opaque());

    let result = negotiate(&caps, &desired(&[("dem", 1)], &[("eps", 2)])).unwrap();
    assert_eq!(result.payload.len(), 1);
    assert_eq!(result.dropped(), 1);
}

#[test]
fn custom_centerline_on_basic_pipeline_warns_with_upgrade_hint() {
    let caps = CapabilityDescriptor::from_names(["dem", "out_dir"]);
    let mut params = RemParameters::new("dem.tif", "out");
    params.centerline = CenterlineSource::Custom(PathBuf::from("river.shp"));
    params.k = Neighbors::Fixed(8);

    let result = negotiate(&caps, &params.desired()).unwrap();
    assert_eq!(result.payload.len(), 2);
    let centerline = result
        .warnings
        .iter()
        .find(|w| w.contains("`centerline_shp`"))
        .unwrap();
    assert!(centerline.contains("newer pipeline release"));
    assert_eq!(result.dropped(), 6);
}
