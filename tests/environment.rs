use std::collections::HashMap;

use fz3d::environment::{BuildEnv, NodeEnv, DEFAULT_API_BASE_URL};
use fz3d::EnvError;

fn lookup(pairs: &[(&str, &str)]) -> impl FnMut(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn unset_variables_use_defaults() {
    let env = BuildEnv::from_lookup(lookup(&[])).unwrap();

    assert_eq!(env.page_title, None);
    assert_eq!(env.api_base_url, DEFAULT_API_BASE_URL);
    assert_eq!(env.public_path, "");
    assert_eq!(env.is_dev(), cfg!(debug_assertions));
    assert_eq!(env.is_prod(), !cfg!(debug_assertions));
    assert!(!env.is_test());
}

#[test]
fn variables_override_defaults() {
    let env = BuildEnv::from_lookup(lookup(&[
        ("FZ3D_MODE", "production"),
        ("FZ3D_APP_TITLE", "Factory twin"),
        ("FZ3D_BASE_API", "https://example.com/v1/"),
        ("FZ3D_PUBLIC_PATH", "/static"),
    ]))
    .unwrap();

    assert_eq!(env.mode, NodeEnv::Production);
    assert!(env.is_prod());
    assert_eq!(env.page_title.as_deref(), Some("Factory twin"));
    assert_eq!(env.api_url("/models"), "https://example.com/v1/models");
    assert_eq!(env.public_path, "/static");
}

#[test]
fn empty_values_count_as_unset() {
    let env = BuildEnv::from_lookup(lookup(&[("FZ3D_BASE_API", ""), ("FZ3D_MODE", "")])).unwrap();

    assert_eq!(env.api_base_url, "/api");
    assert_eq!(env, BuildEnv::default());
}

#[test]
fn invalid_mode_is_an_error() {
    let result = BuildEnv::from_lookup(lookup(&[("FZ3D_MODE", "staging")]));

    assert_eq!(result, Err(EnvError::InvalidMode("staging".to_string())));
}

#[test]
fn test_mode_is_recognized() {
    let env = BuildEnv::from_lookup(lookup(&[("FZ3D_MODE", "Test")])).unwrap();

    assert!(env.is_test());
    assert_eq!(env.mode.to_string(), "test");
}

#[test]
fn build_settings_are_readable() {
    let env = BuildEnv::from_build();

    assert!(!env.api_base_url.is_empty());
}
