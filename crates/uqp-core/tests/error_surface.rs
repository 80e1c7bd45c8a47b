use uqp_core::errors::{ErrorInfo, UqpError};

fn sample_info(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
        .with_context("unit", "m")
        .with_context("reason", "example")
}

#[test]
fn dimensionality_error_surface() {
    let err = UqpError::Dimensionality(sample_info("incompatible-units", "m vs s"));
    assert_eq!(err.code(), "incompatible-units");
    assert!(err.info().context.contains_key("unit"));
    assert_eq!(err.family(), "Dimensionality");
}

#[test]
fn parse_error_surface() {
    let err = UqpError::Parse(sample_info("compact-notation", "missing separator"));
    assert_eq!(err.info().code, "compact-notation");
    assert!(err.info().context.contains_key("reason"));
}

#[test]
fn unknown_unit_error_surface() {
    let err = UqpError::UnknownUnit(sample_info("unknown-symbol", "furlongs"));
    assert_eq!(err.family(), "UnknownUnit");
}

#[test]
fn numeric_error_surface() {
    let err = UqpError::Numeric(sample_info("negative-sqrt", "sqrt(-1)"));
    assert_eq!(err.code(), "negative-sqrt");
}

#[test]
fn arguments_and_config_error_surface() {
    let args = UqpError::Arguments(sample_info("missing-argument", "t"));
    let config = UqpError::Config(sample_info("invalid-sigfigs", "zero"));
    assert_eq!(args.family(), "Arguments");
    assert_eq!(config.family(), "Config");
}

#[test]
fn display_includes_context_and_hint() {
    let err = UqpError::Parse(
        ErrorInfo::new("invalid-number", "cannot parse 'x'")
            .with_context("input", "x")
            .with_hint("use a decimal literal"),
    );
    let rendered = err.to_string();
    assert_eq!(
        rendered,
        "parse error: [invalid-number] cannot parse 'x' (input=x); hint: use a decimal literal"
    );
}

#[test]
fn errors_roundtrip_through_json() {
    let err = UqpError::Dimensionality(sample_info("offset-addition", "degC + degC"));
    let json = serde_json::to_string(&err).unwrap();
    assert!(json.contains("\"family\":\"Dimensionality\""));
    let restored: UqpError = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, err);
}
