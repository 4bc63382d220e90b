//! 配置加载测试

use std::collections::HashMap;
use std::time::Duration;

use todo_svc::config::{ENV_CONSUL_ADDR, ENV_HTTP_ADDR, ENV_LOG_JSON};
use todo_svc::{BackendType, Config, ErrorCode};

#[test]
fn empty_file_uses_defaults() {
    let config = Config::from_toml("").unwrap();

    assert_eq!(config.service.name, "todosvc");
    assert_eq!(config.service.tags, vec!["prod".to_string()]);
    assert_eq!(config.server.http_addr, "0.0.0.0:8000");
    assert_eq!(config.log.level, "info");
    assert!(!config.log.json);
    assert!(config.registry.is_none());
    assert!(config.discovery_config().is_none());
    assert_eq!(config.http_addr().unwrap().port(), 8000);
}

#[test]
fn parses_full_file() {
    let config = Config::from_toml(
        r#"
        [service]
        name = "todosvc"
        tags = ["prod", "eu"]

        [server]
        http_addr = "127.0.0.1:9000"
        shutdown_timeout = 2
        drain_delay_ms = 250

        [registry]
        consul_addr = "http://consul:8500"
        advertise_addr = "10.1.2.3"

        [registry.health_check]
        interval = 3

        [log]
        level = "debug"
        json = true
        "#,
    )
    .unwrap();

    assert_eq!(config.service.tags, vec!["prod".to_string(), "eu".to_string()]);
    assert_eq!(config.http_addr().unwrap().port(), 9000);
    assert_eq!(
        config.runtime_config().shutdown_timeout,
        Duration::from_secs(2)
    );
    assert_eq!(
        config.runtime_config().drain_delay,
        Duration::from_millis(250)
    );
    assert!(config.log.json);

    let registry = config.registry.as_ref().unwrap();
    assert_eq!(registry.advertise_addr.as_deref(), Some("10.1.2.3"));

    let discovery = config.discovery_config().unwrap();
    assert_eq!(discovery.backend, BackendType::Consul);
    assert_eq!(discovery.address, "http://consul:8500");
    let check = discovery.health_check.unwrap();
    assert_eq!(check.interval, 3);
    assert_eq!(check.path, "/health");
}

#[test]
fn overrides_replace_file_values() {
    let mut config = Config::from_toml("[server]\nhttp_addr = \"127.0.0.1:9000\"").unwrap();
    let env: HashMap<&str, &str> = HashMap::from([
        (ENV_HTTP_ADDR, "127.0.0.1:9100"),
        (ENV_CONSUL_ADDR, "http://127.0.0.1:8500"),
        (ENV_LOG_JSON, "TRUE"),
    ]);

    config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

    assert_eq!(config.server.http_addr, "127.0.0.1:9100");
    assert_eq!(
        config.registry.as_ref().unwrap().consul_addr,
        "http://127.0.0.1:8500"
    );
    assert!(config.log.json);
}

#[test]
fn rejects_invalid_values() {
    let err = Config::from_toml("[server]\nshutdown_timeout = \"soon\"").unwrap_err();
    assert_eq!(err.code(), ErrorCode::ConfigurationError);

    let config = Config::from_toml("[server]\nhttp_addr = \"not an address\"").unwrap();
    assert_eq!(
        config.http_addr().unwrap_err().code(),
        ErrorCode::ConfigurationError
    );
}

#[test]
fn missing_file_is_an_io_error() {
    let err = Config::load_from_file("/nonexistent/todosvc.toml").unwrap_err();
    assert_eq!(err.code(), ErrorCode::IoError);
}
