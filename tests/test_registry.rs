// tests/test_registry.rs
use rs_alertlog::loggers::{
    FormatId, Level, LogEvent, LoggerConfig, LoggerKey, LoggerRegistry, Payload, SendFn, send_fn,
};
use rs_alertlog::{BoxError, LogError, get_logger};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Send callback that only counts deliveries.
fn counting_send() -> (SendFn, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    let c = count.clone();
    let send = send_fn(move |_: Payload| {
        c.fetch_add(1, Ordering::SeqCst);
        async { Ok::<_, BoxError>(Value::Null) }
    });
    (send, count)
}

#[test]
fn unconfigured_keys_are_not_found() {
    let registry = LoggerRegistry::new();

    assert!(matches!(registry.get("x"), Err(LogError::NotConfigured(LoggerKey::Name(_)))));
    assert!(matches!(registry.get(42), Err(LogError::NotConfigured(LoggerKey::Number(42)))));
    assert!(matches!(
        registry.get_logger(None, None),
        Err(LogError::NotConfigured(LoggerKey::Default))
    ));
}

#[test]
fn configured_key_resolves_to_same_logger() {
    let registry = LoggerRegistry::new();
    let (send, _) = counting_send();

    let created = registry
        .get_logger(Some("x".into()), Some(LoggerConfig::new().with_send(send).with_app_name("Api")))
        .unwrap();
    let fetched = registry.get_logger(Some("x".into()), None).unwrap();

    assert!(created.same_as(&fetched));
    assert_eq!(fetched.config().app_name(), "Api");
    assert!(registry.contains("x"));
    assert!(!registry.contains(LoggerKey::Default));
}

#[test]
fn config_only_targets_default_logger() {
    let registry = LoggerRegistry::new();
    let (send, _) = counting_send();

    let logger = registry
        .get_logger(None, Some(LoggerConfig::new().with_send(send)))
        .unwrap();
    assert!(logger.same_as(&registry.default_logger().unwrap()));
    assert_eq!(registry.keys(), vec![LoggerKey::Default]);
}

#[test]
fn keys_are_independent() {
    let registry = LoggerRegistry::new();
    let (send, _) = counting_send();

    let a = registry.configure("a", LoggerConfig::new().with_send(send.clone()).with_app_name("A")).unwrap();
    let b = registry.configure(1, LoggerConfig::new().with_send(send).with_app_name("B")).unwrap();

    assert!(!a.same_as(&b));
    assert_eq!(registry.get("a").unwrap().config().app_name(), "A");
    assert_eq!(registry.get(1).unwrap().config().app_name(), "B");
    assert_eq!(registry.keys().len(), 2);
}

#[test]
fn first_configuration_applies_defaults() {
    let registry = LoggerRegistry::new();
    let (send, _) = counting_send();

    let logger = registry.configure_default(LoggerConfig::new().with_send(send)).unwrap();
    let cfg = logger.config();
    assert_eq!(cfg.app_name(), "My App");
    assert_eq!(cfg.min_level(), Level::Warning);
    assert!(matches!(cfg.format(), FormatId::Id(1)));
    assert!(cfg.colors().is_none());
}

#[tokio::test]
async fn reconfiguring_app_name_preserves_other_fields() {
    let registry = LoggerRegistry::new();
    let (send, count) = counting_send();

    registry
        .configure(
            "svc",
            LoggerConfig::new()
                .with_send(send)
                .with_min_level(Level::Info)
                .with_format(FormatId::custom(|e: &LogEvent| Ok::<_, BoxError>(e.message.clone())))
                .with_color(Level::Info, "#00ff00"),
        )
        .unwrap();

    let logger = registry
        .configure("svc", LoggerConfig::new().with_app_name("New"))
        .unwrap();
    let cfg = logger.config();
    assert_eq!(cfg.app_name(), "New");
    assert_eq!(cfg.min_level(), Level::Info);
    assert!(matches!(cfg.format(), FormatId::Render(_)));
    assert_eq!(cfg.color_for(Level::Info), "#00ff00");

    let sent = logger.info("still delivered", None).await.unwrap();
    assert_eq!(sent, Some(Value::Null));
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn invalid_configurations_are_rejected() {
    let registry = LoggerRegistry::new();
    let (send, _) = counting_send();

    // send is required on first configuration
    let err = registry.configure("a", LoggerConfig::new().with_app_name("A")).unwrap_err();
    assert!(matches!(err, LogError::InvalidConfig(_)));
    assert!(err.to_string().contains("Required"));
    assert!(!registry.contains("a"));

    let err = registry
        .configure("b", LoggerConfig::new().with_send(send.clone()).with_app_name(""))
        .unwrap_err();
    assert!(matches!(err, LogError::InvalidConfig(_)));

    let err = registry
        .configure("c", LoggerConfig::new().with_send(send.clone()).with_format("TEAMS"))
        .unwrap_err();
    assert!(matches!(err, LogError::InvalidConfig(_)));

    let err = registry
        .configure("d", LoggerConfig::new().with_send(send.clone()).with_min_level("loud"))
        .unwrap_err();
    assert!(matches!(err, LogError::InvalidConfig(_)));

    let err = registry
        .configure("e", LoggerConfig::new().with_send(send).with_format(9u32))
        .unwrap_err();
    assert!(matches!(err, LogError::InvalidConfig(_)));
}

#[test]
fn failed_update_keeps_previous_config() {
    let registry = LoggerRegistry::new();
    let (send, _) = counting_send();

    let logger = registry
        .configure("svc", LoggerConfig::new().with_send(send).with_app_name("Before"))
        .unwrap();
    assert!(logger.set_config(LoggerConfig::new().with_app_name("After").with_min_level(99)).is_err());
    assert_eq!(logger.config().app_name(), "Before");
    assert_eq!(logger.config().min_level(), Level::Warning);
}

#[test]
fn global_registry_is_shared() {
    let (send, _) = counting_send();
    let key = LoggerKey::from("global-registry-test");

    assert!(matches!(get_logger(Some(key.clone()), None), Err(LogError::NotConfigured(_))));
    let created = get_logger(Some(key.clone()), Some(LoggerConfig::new().with_send(send))).unwrap();
    let again = LoggerRegistry::global().get(key).unwrap();
    assert!(created.same_as(&again));
}
