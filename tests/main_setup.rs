use portfolio_gate::{AppConfig, config::Env};
use serial_test::serial;
use std::{env, panic};

const CONFIG_VARS: [&str; 6] = [
    "APP_ENV",
    "JWT_SECRET",
    "BACKEND_URL",
    "UPSTREAM_URL",
    "BIND_ADDR",
    "COOKIE_SECURE",
];

// --- Setup/Teardown Utilities ---

/// Runs `test` with exactly `vars` set (all other config vars cleared), restores the
/// previous environment, and hands back the `catch_unwind` outcome.
fn run_with_env<T, R>(vars: &[(&str, &str)], test: T) -> std::thread::Result<R>
where
    T: FnOnce() -> R + panic::UnwindSafe,
{
    let originals: Vec<(&str, Option<String>)> = CONFIG_VARS
        .iter()
        .map(|&var| (var, env::var(var).ok()))
        .collect();

    unsafe {
        for var in CONFIG_VARS {
            env::remove_var(var);
        }
        for (key, value) in vars {
            env::set_var(key, value);
        }
    }

    let result = panic::catch_unwind(test);

    for (key, original_value) in originals {
        unsafe {
            match original_value {
                Some(val) => env::set_var(key, val),
                None => env::remove_var(key),
            }
        }
    }

    result
}

// --- Tests ---

#[test]
#[serial]
fn test_app_config_production_fail_fast_without_secret() {
    let result = run_with_env(
        &[
            ("APP_ENV", "production"),
            ("BACKEND_URL", "https://api.team.dev"),
            ("UPSTREAM_URL", "http://renderer:3001"),
        ],
        AppConfig::load,
    );

    assert!(
        result.is_err(),
        "Production config loading should panic without JWT_SECRET"
    );
}

#[test]
#[serial]
fn test_app_config_production_fail_fast_without_upstream() {
    let result = run_with_env(
        &[
            ("APP_ENV", "production"),
            ("JWT_SECRET", "prod-secret"),
            ("BACKEND_URL", "https://api.team.dev"),
        ],
        AppConfig::load,
    );

    assert!(result.is_err());
}

#[test]
#[serial]
fn test_app_config_production_complete() {
    let config = run_with_env(
        &[
            ("APP_ENV", "production"),
            ("JWT_SECRET", "prod-secret"),
            ("BACKEND_URL", "https://api.team.dev/"),
            ("UPSTREAM_URL", "http://renderer:3001"),
        ],
        AppConfig::load,
    )
    .unwrap();

    assert_eq!(config.env, Env::Production);
    assert_eq!(config.jwt_secret, "prod-secret");
    // Trailing slash trimmed so paths can be appended directly.
    assert_eq!(config.backend_url, "https://api.team.dev");
    assert!(config.cookie_secure);
    assert_eq!(config.bind_addr, "0.0.0.0:3000");
}

#[test]
#[serial]
fn test_app_config_local_env_defaults() {
    let config = run_with_env(&[("APP_ENV", "local")], AppConfig::load).unwrap();

    assert_eq!(config.env, Env::Local);
    assert_eq!(config.jwt_secret, "portfolio-local-development-secret");
    assert_eq!(config.backend_url, "http://localhost:5000");
    assert_eq!(config.upstream_url, "http://localhost:3001");
    assert!(!config.cookie_secure);
}

#[test]
#[serial]
fn test_app_config_local_overrides() {
    let config = run_with_env(
        &[
            ("JWT_SECRET", "dev-secret"),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("COOKIE_SECURE", "true"),
        ],
        AppConfig::load,
    )
    .unwrap();

    assert_eq!(config.env, Env::Local);
    assert_eq!(config.jwt_secret, "dev-secret");
    assert_eq!(config.bind_addr, "127.0.0.1:8080");
    assert!(config.cookie_secure);
}

#[test]
fn test_app_config_default_is_local() {
    let config = AppConfig::default();
    assert_eq!(config.env, Env::Local);
    assert!(!config.jwt_secret.is_empty());
}
