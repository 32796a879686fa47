//! Tests for the topic registry, config resolution, and connection gate.

use courier::{ClientConfig, Connection, CourierError, TopicConfig};

fn connected() -> Connection {
    let connection = Connection::new("localhost:9092").unwrap();
    connection.connect();
    connection
}

#[test]
fn create_topic_returns_exact_name() {
    let connection = connected();
    let topic = connection
        .create_topic("orders", TopicConfig::new().set("acks", "1"))
        .unwrap();
    assert_eq!(topic.name(), "orders");
}

#[test]
fn config_lookup_is_three_way() {
    let connection = Connection::from_config(
        ClientConfig::new()
            .set("bootstrap.servers", "localhost:9092")
            .set("message.timeout.ms", "5000"),
    )
    .unwrap();
    connection.connect();

    let topic = connection
        .create_topic("orders", TopicConfig::new().set("acks", "1"))
        .unwrap();

    // Set on the topic overlay
    assert_eq!(topic.get("acks").unwrap(), Some("1".to_string()));
    // Inherited from the connection defaults
    assert_eq!(
        topic.get("message.timeout.ms").unwrap(),
        Some("5000".to_string())
    );
    // Never set: absent, not an error
    assert_eq!(topic.get("missing").unwrap(), None);
    assert_eq!(topic.get("").unwrap(), None);
}

#[test]
fn overlay_overrides_connection_default() {
    let connection = Connection::from_config(
        ClientConfig::new()
            .set("bootstrap.servers", "localhost:9092")
            .set("message.timeout.ms", "5000"),
    )
    .unwrap();
    connection.connect();

    let topic = connection
        .create_topic("orders", TopicConfig::new().set("message.timeout.ms", "9000"))
        .unwrap();
    assert_eq!(
        topic.get("message.timeout.ms").unwrap(),
        Some("9000".to_string())
    );
}

#[test]
fn empty_topic_name_is_rejected() {
    let connection = connected();
    let err = connection
        .create_topic("", TopicConfig::new())
        .unwrap_err();
    assert!(matches!(err, CourierError::InvalidArgument(_)));
}

#[test]
fn illegal_topic_names_are_rejected() {
    let connection = connected();
    let too_long = "x".repeat(250);
    for name in ["orders/archive", "orders topic", "örders", too_long.as_str()] {
        let err = connection
            .create_topic(name, TopicConfig::new())
            .unwrap_err();
        assert!(
            matches!(err, CourierError::InvalidArgument(_)),
            "expected InvalidArgument for {name:?}"
        );
    }
}

#[test]
fn malformed_config_value_is_rejected() {
    let connection = connected();
    let err = connection
        .create_topic("orders", TopicConfig::new().set("acks", "banana"))
        .unwrap_err();
    assert!(matches!(err, CourierError::InvalidArgument(_)));

    let err = connection
        .create_topic("orders", TopicConfig::new().set("num.partitions", "0"))
        .unwrap_err();
    assert!(matches!(err, CourierError::InvalidArgument(_)));
}

#[test]
fn missing_brokers_are_rejected() {
    let err = Connection::from_config(ClientConfig::new()).unwrap_err();
    assert!(matches!(err, CourierError::InvalidArgument(_)));

    let err = Connection::new("   ").unwrap_err();
    assert!(matches!(err, CourierError::InvalidArgument(_)));
}

#[test]
fn gate_is_rechecked_on_every_call() {
    let connection = connected();
    let topic = connection
        .create_topic("orders", TopicConfig::new())
        .unwrap();

    assert!(topic.native_handle().is_ok());

    connection.disconnect();
    let err = topic.native_handle().unwrap_err();
    assert!(matches!(err, CourierError::NotConnected));
    // Name retrieval does not require connectivity
    assert_eq!(topic.name(), "orders");

    connection.connect();
    assert!(topic.native_handle().is_ok());
}

#[test]
fn lazy_creation_defers_the_readiness_check() {
    let connection = Connection::new("localhost:9092").unwrap();

    // Not connected: creation still succeeds by default
    let topic = connection
        .create_topic("orders", TopicConfig::new().set("acks", "1"))
        .unwrap();
    assert_eq!(topic.name(), "orders");
    assert_eq!(topic.get("acks").unwrap(), Some("1".to_string()));

    let err = topic.native_handle().unwrap_err();
    assert!(matches!(err, CourierError::NotConnected));
}

#[test]
fn eager_creation_requires_readiness() {
    let connection = Connection::new("localhost:9092").unwrap();

    let err = connection
        .create_topic("orders", TopicConfig::new().with_eager_validation(true))
        .unwrap_err();
    assert!(matches!(err, CourierError::NotConnected));

    connection.connect();
    let topic = connection
        .create_topic("orders", TopicConfig::new().with_eager_validation(true))
        .unwrap();
    assert_eq!(topic.name(), "orders");
}

#[test]
fn close_invalidates_config_snapshots() {
    let connection = connected();
    let topic = connection
        .create_topic("orders", TopicConfig::new().set("acks", "1"))
        .unwrap();
    assert_eq!(topic.get("acks").unwrap(), Some("1".to_string()));

    connection.close();

    // Not absent and not a stale value: a hard error
    let err = topic.get("acks").unwrap_err();
    assert!(matches!(err, CourierError::ConfigInvalid(_)));
    let err = topic.get("missing").unwrap_err();
    assert!(matches!(err, CourierError::ConfigInvalid(_)));
}

#[test]
fn disconnect_does_not_invalidate_config() {
    let connection = connected();
    let topic = connection
        .create_topic("orders", TopicConfig::new().set("acks", "1"))
        .unwrap();

    connection.disconnect();
    assert_eq!(topic.get("acks").unwrap(), Some("1".to_string()));
}

#[test]
fn duplicate_creation_coalesces_identical_overlays() {
    let connection = connected();
    let first = connection
        .create_topic("orders", TopicConfig::new().set("acks", "1"))
        .unwrap();
    let second = connection
        .create_topic("orders", TopicConfig::new().set("acks", "1"))
        .unwrap();

    // Same logical topic: records appended through one handle are visible
    // through the other
    let native = first.native_handle().unwrap();
    native.append(None, b"payload");
    let records = second.native_handle().unwrap().fetch(0, 16);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].payload, b"payload");
}

#[test]
fn duplicate_creation_rejects_divergent_overlays() {
    let connection = connected();
    connection
        .create_topic("orders", TopicConfig::new().set("acks", "1"))
        .unwrap();
    let err = connection
        .create_topic("orders", TopicConfig::new().set("acks", "all"))
        .unwrap_err();
    assert!(matches!(err, CourierError::ConfigConflict(_)));
}

#[test]
fn topic_names_lists_owned_topics() {
    let connection = connected();
    connection
        .create_topic("orders", TopicConfig::new())
        .unwrap();
    connection
        .create_topic("invoices", TopicConfig::new())
        .unwrap();

    assert_eq!(connection.topic_names(), ["invoices", "orders"]);

    connection.close();
    assert!(connection.topic_names().is_empty());
}
