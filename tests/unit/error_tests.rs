//! Unit tests for the error taxonomy.

use geotrackd::AppError;

#[test]
fn display_prefixes_carry_the_taxonomy_code() {
    let cases = [
        (AppError::Config("x".into()), "config:"),
        (AppError::Store("x".into()), "store:"),
        (AppError::InvalidSettings("x".into()), "invalid_settings:"),
        (AppError::PermissionDenied("x".into()), "permission_denied:"),
        (AppError::HostUnavailable("x".into()), "host_unavailable:"),
        (AppError::NotFound("x".into()), "not_found:"),
        (AppError::Bridge("x".into()), "bridge:"),
        (AppError::Io("x".into()), "io:"),
    ];
    for (err, prefix) in cases {
        assert!(
            err.to_string().starts_with(prefix),
            "{err} should start with {prefix}"
        );
    }
}

#[test]
fn sqlx_errors_map_to_store() {
    let err: AppError = sqlx::Error::RowNotFound.into();
    assert!(matches!(err, AppError::Store(_)));
}

#[test]
fn toml_errors_map_to_config() {
    let parse_err = toml::from_str::<toml::Value>("= broken").unwrap_err();
    let err: AppError = parse_err.into();
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn errors_implement_std_error() {
    fn assert_error<E: std::error::Error>(_: &E) {}
    assert_error(&AppError::Io("disk".into()));
}
