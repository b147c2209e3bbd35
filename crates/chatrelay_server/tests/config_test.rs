//! Tests for relay configuration.

use chatrelay_server::{DEFAULT_BASE_URL, DEFAULT_BODY_LIMIT_BYTES, RelayConfig};
use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| vars.get(key).cloned()
}

#[test]
fn test_defaults() -> Result<(), Box<dyn std::error::Error>> {
    let config = RelayConfig::default();

    assert_eq!(config.server.bind, "0.0.0.0:3000");
    assert_eq!(config.server.body_limit_bytes, DEFAULT_BODY_LIMIT_BYTES);
    assert_eq!(config.backend.base_url, DEFAULT_BASE_URL);
    assert_eq!(config.backend.timeout_secs, 30);
    assert_eq!(config.backend.response_field, "generated_text");
    assert_eq!(config.prompt.history_turns, 5);
    assert_eq!(config.prompt.user_label, "User");
    assert_eq!(config.prompt.assistant_label, "Assistant");
    assert_eq!(*config.sampling.max_new_tokens(), 512);
    assert!(config.uses_placeholder_backend());
    assert_eq!(
        config.endpoint()?.as_str(),
        "http://localhost:8000/generate"
    );
    config.validate()?;
    Ok(())
}

#[test]
fn test_parse_full_toml() -> Result<(), Box<dyn std::error::Error>> {
    let toml = r#"
[server]
bind = "127.0.0.1:8080"

[backend]
base_url = "https://gpu.example.com/"
timeout_secs = 45
response_field = "text"

[sampling]
max_new_tokens = 100
do_sample = false
temperature = 0.2
top_p = 0.5

[prompt]
history_turns = 3
user_label = "ユーザー"
assistant_label = "アシスタント"
"#;

    let config = RelayConfig::from_toml_str(toml)?;

    assert_eq!(config.bind_addr()?.port(), 8080);
    assert_eq!(
        config.endpoint()?.as_str(),
        "https://gpu.example.com/generate"
    );
    assert_eq!(config.timeout(), Duration::from_secs(45));
    assert_eq!(config.backend.response_field, "text");
    assert_eq!(*config.sampling.max_new_tokens(), 100);
    assert!(!*config.sampling.do_sample());
    assert_eq!(config.window()?.entries(), 6);
    assert_eq!(config.labels().user(), "ユーザー");
    assert!(!config.uses_placeholder_backend());
    config.validate()?;
    Ok(())
}

#[test]
fn test_partial_toml_keeps_defaults() -> Result<(), Box<dyn std::error::Error>> {
    let config = RelayConfig::from_toml_str("[sampling]\ntemperature = 1.1\n")?;

    assert_eq!(*config.sampling.temperature(), 1.1);
    assert_eq!(*config.sampling.top_p(), 0.9);
    assert_eq!(*config.sampling.max_new_tokens(), 512);
    assert_eq!(config.prompt.history_turns, 5);
    Ok(())
}

#[test]
fn test_invalid_toml_is_configuration_error() {
    let err = RelayConfig::from_toml_str("[server\nbind = ").expect_err("Invalid TOML");
    assert_eq!(err.kind.category(), "configuration");
}

#[test]
fn test_endpoint_url_used_verbatim() -> Result<(), Box<dyn std::error::Error>> {
    let config = RelayConfig::default().apply_env_with(env(&[
        ("GENERATION_API_URL", "https://abc.ngrok-free.app/generate"),
        ("GENERATION_BASE_URL", "http://ignored:9000"),
    ]))?;

    assert_eq!(
        config.endpoint()?.as_str(),
        "https://abc.ngrok-free.app/generate"
    );
    assert!(!config.uses_placeholder_backend());
    Ok(())
}

#[test]
fn test_env_overrides() -> Result<(), Box<dyn std::error::Error>> {
    let config = RelayConfig::default().apply_env_with(env(&[
        ("CHATRELAY_BIND", "127.0.0.1:4000"),
        ("GENERATION_BASE_URL", "http://backend:8000"),
        ("GENERATION_TIMEOUT_SECS", " 10 "),
        ("GENERATION_RESPONSE_FIELD", "output"),
        ("GENERATION_MAX_NEW_TOKENS", "100"),
        ("GENERATION_DO_SAMPLE", "false"),
        ("GENERATION_TEMPERATURE", "0.3"),
        ("GENERATION_TOP_P", "0.8"),
        ("CHAT_HISTORY_TURNS", "2"),
        ("CHAT_USER_LABEL", "Q"),
        ("CHAT_ASSISTANT_LABEL", "A"),
    ]))?;

    assert_eq!(config.server.bind, "127.0.0.1:4000");
    assert_eq!(
        config.endpoint()?.as_str(),
        "http://backend:8000/generate"
    );
    assert_eq!(config.timeout(), Duration::from_secs(10));
    assert_eq!(config.backend.response_field, "output");
    assert_eq!(*config.sampling.max_new_tokens(), 100);
    assert!(!*config.sampling.do_sample());
    assert_eq!(*config.sampling.temperature(), 0.3);
    assert_eq!(*config.sampling.top_p(), 0.8);
    assert_eq!(config.window()?.turns(), 2);
    assert_eq!(config.labels().assistant(), "A");
    config.validate()?;
    Ok(())
}

#[test]
fn test_env_leaves_unset_values() -> Result<(), Box<dyn std::error::Error>> {
    let base = RelayConfig::from_toml_str("[sampling]\nmax_new_tokens = 64\n")?;

    let config = base.clone().apply_env_with(env(&[]))?;

    assert_eq!(config, base);
    Ok(())
}

#[test]
fn test_unparseable_env_value_rejected() {
    let err = RelayConfig::default()
        .apply_env_with(env(&[("GENERATION_MAX_NEW_TOKENS", "lots")]))
        .expect_err("Non-numeric token budget");

    assert_eq!(err.kind.category(), "configuration");
    assert!(err.public_message().contains("GENERATION_MAX_NEW_TOKENS"));
}

#[test]
fn test_zero_history_window_rejected() {
    let config = RelayConfig::default()
        .apply_env_with(env(&[("CHAT_HISTORY_TURNS", "0")]))
        .expect("Zero parses as a number");

    assert!(config.window().is_err());
    assert!(config.validate().is_err());
}

#[test]
fn test_bad_bind_address_rejected() {
    let config = RelayConfig::from_toml_str("[server]\nbind = \"not an address\"\n")
        .expect("TOML itself is valid");

    let err = config.validate().expect_err("Bind address is invalid");
    assert!(err.public_message().contains("not an address"));
}

#[test]
fn test_bad_endpoint_rejected() {
    let config = RelayConfig::from_toml_str("[backend]\nendpoint_url = \"ftp://example.com\"\n")
        .expect("TOML itself is valid");

    assert!(config.endpoint().is_err());
    assert!(config.validate().is_err());
}

#[test]
fn test_out_of_range_sampling_rejected() {
    let config = RelayConfig::from_toml_str("[sampling]\ntop_p = 1.5\n").expect("Valid TOML");

    assert!(config.validate().is_err());
}

#[test]
fn test_zero_timeout_rejected() {
    let config = RelayConfig::from_toml_str("[backend]\ntimeout_secs = 0\n").expect("Valid TOML");

    assert!(config.validate().is_err());
}

#[test]
fn test_from_file() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::temp_dir().join(format!("chatrelay-config-{}.toml", std::process::id()));
    let mut file = std::fs::File::create(&path)?;
    writeln!(file, "[prompt]\nhistory_turns = 7")?;
    drop(file);

    let loaded = RelayConfig::from_file(&path);
    std::fs::remove_file(&path)?;

    assert_eq!(loaded?.prompt.history_turns, 7);
    Ok(())
}

#[test]
fn test_missing_file_is_configuration_error() {
    let err = RelayConfig::from_file("/definitely/not/here.toml").expect_err("Missing file");
    assert_eq!(err.kind.category(), "configuration");
}

#[test]
fn test_body_limit_settings() -> Result<(), Box<dyn std::error::Error>> {
    let config = RelayConfig::from_toml_str("[server]\nbody_limit_bytes = 4096\n")?;
    assert_eq!(config.server.body_limit_bytes, 4096);

    let config = config.apply_env_with(env(&[("CHATRELAY_BODY_LIMIT_BYTES", "8192")]))?;
    assert_eq!(config.server.body_limit_bytes, 8192);

    let zero = RelayConfig::from_toml_str("[server]\nbody_limit_bytes = 0\n")?;
    assert!(zero.validate().is_err());
    Ok(())
}
