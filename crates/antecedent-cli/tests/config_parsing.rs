use std::{env, fs};

use antecedent_cli::config::loader::load_config;

#[test]
fn config_parsing_and_env_overrides_and_validation() {
    // Create a temporary TOML configuration file
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("antecedent.toml");

    let toml_content = r#"
[connection]
server = "https://kubernetes.example:6443"
token = "s3cret"
insecure_skip_tls_verify = true
timeout_ms = 5000

[retry]
initial_interval_ms = 20
factor = 2.0
jitter = 0.0
max_attempts = 6

[logging]
level = "debug"
"#;
    fs::write(&path, toml_content).expect("write toml");

    // 1) Valid config parses
    let cfg = load_config(path.to_str()).expect("should parse config");
    assert_eq!(cfg.connection.server, "https://kubernetes.example:6443");
    assert_eq!(cfg.connection.token.as_deref(), Some("s3cret"));
    assert!(cfg.connection.insecure_skip_tls_verify);
    assert_eq!(cfg.connection.timeout_ms, 5000);
    assert_eq!(cfg.retry.max_attempts, 6);
    assert_eq!(cfg.retry.max_elapsed_ms, None);
    assert_eq!(cfg.logging.level.to_ascii_lowercase(), "debug");

    // 2) Env override should win over file
    unsafe {
        env::set_var("ANTECEDENT__RETRY__MAX_ATTEMPTS", "9");
    }
    let cfg_env = load_config(path.to_str()).expect("should parse config with env overrides");
    assert_eq!(cfg_env.retry.max_attempts, 9);
    // cleanup env var
    unsafe {
        env::remove_var("ANTECEDENT__RETRY__MAX_ATTEMPTS");
    }

    // 3) Sections left out fall back to defaults
    let partial_path = dir.path().join("partial.toml");
    fs::write(&partial_path, "[logging]\nlevel = \"info\"\n").expect("write partial toml");
    let cfg = load_config(partial_path.to_str()).expect("should parse partial config");
    assert_eq!(cfg.connection.server, "http://127.0.0.1:8001");
    assert_eq!(cfg.retry.max_attempts, 4);
    assert_eq!(cfg.retry.factor, 5.0);

    // 4) Invalid config (factor < 1) should error
    let invalid_path = dir.path().join("invalid.toml");
    let invalid_toml = r#"
[retry]
factor = 0.5
"#;
    fs::write(&invalid_path, invalid_toml).expect("write invalid toml");
    let err = load_config(invalid_path.to_str()).expect_err("expected validation error");
    assert!(err.contains("retry.factor"));

    // 5) An explicit path that does not exist is an error
    let missing = dir.path().join("missing.toml");
    let err = load_config(missing.to_str()).expect_err("expected missing file error");
    assert!(err.contains("not found"));
}
