//! Example consumer demonstrating type-safe message handling.
//!
//! This example shows how to:
//! - Define message types with the CourierMessage trait
//! - Create message handlers
//! - Use the topic_handlers! macro to register handlers
//! - Share one connection between a producer and a consumer
//! - Handle graceful shutdown
//!
//! To run this example:
//! ```bash
//! cargo run --example consumer
//! ```
//!
//! A producer task on the same connection feeds the consumer, so the example
//! is self-contained.

use courier::{topic_handlers, Connection, Consumer, ConsumerConfig, CourierMessage, Producer};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Example message type for user creation events
#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserCreated {
    user_id: String,
    email: String,
    name: String,
}

impl CourierMessage for UserCreated {
    const TOPIC: &'static str = "user.created";
}

/// Example message type for order placement events
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OrderPlaced {
    order_id: String,
    user_id: String,
    amount: f64,
}

impl CourierMessage for OrderPlaced {
    const TOPIC: &'static str = "order.placed";
}

/// Handler for UserCreated messages
async fn handle_user_created(msg: UserCreated) -> anyhow::Result<()> {
    info!(
        "User created - ID: {}, Email: {}, Name: {}",
        msg.user_id, msg.email, msg.name
    );

    // Simulate some processing work
    tokio::time::sleep(Duration::from_millis(50)).await;

    info!("Successfully processed user creation for {}", msg.user_id);
    Ok(())
}

/// Handler for OrderPlaced messages
async fn handle_order_placed(msg: OrderPlaced) -> anyhow::Result<()> {
    info!(
        "Order placed - ID: {}, User: {}, Amount: ${:.2}",
        msg.order_id, msg.user_id, msg.amount
    );

    // Simulate some processing work
    tokio::time::sleep(Duration::from_millis(100)).await;

    info!("Successfully processed order {}", msg.order_id);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .init();

    info!("Starting consumer example");

    let brokers =
        std::env::var("COURIER_BROKERS").unwrap_or_else(|_| "localhost:9092".to_string());
    let group_id =
        std::env::var("COURIER_GROUP_ID").unwrap_or_else(|_| "example-consumer-group".to_string());

    // One shared session: the producer task appends, the consumer polls
    let connection = Connection::new(&brokers)?;
    connection.connect();

    // Create consumer configuration
    let config = ConsumerConfig::new(&group_id)
        .with_max_retries(3)
        .with_initial_backoff(Duration::from_millis(100))
        .with_max_backoff(Duration::from_secs(30));

    info!("Consumer config - Brokers: {}, Group: {}", brokers, group_id);

    // Create handlers using the topic_handlers! macro
    let handlers = topic_handlers![
        UserCreated => handle_user_created,
        OrderPlaced => handle_order_placed,
    ];

    // Create consumer and subscribe to topics
    let consumer = Arc::new(Consumer::new(connection.clone(), config, handlers));
    consumer.subscribe()?;
    info!("Subscribed to topics");

    // Feed the consumer from a producer task on the same connection
    let producer = Producer::with_connection(connection);
    tokio::spawn(async move {
        for i in 1..=5 {
            let user = UserCreated {
                user_id: format!("user-{}", i),
                email: format!("user{}@example.com", i),
                name: format!("User {}", i),
            };
            if let Err(e) = producer.send(&user).await {
                info!("Producer stopped: {}", e);
                return;
            }

            let order = OrderPlaced {
                order_id: format!("order-{}", i),
                user_id: format!("user-{}", i),
                amount: 99.99 * i as f64,
            };
            if let Err(e) = producer.send_with_key(&order, &order.user_id).await {
                info!("Producer stopped: {}", e);
                return;
            }

            tokio::time::sleep(Duration::from_millis(500)).await;
        }
    });

    // Get shutdown handle for graceful shutdown
    let shutdown_handle = consumer.shutdown_handle();

    // Spawn shutdown handler
    tokio::spawn(async move {
        // Wait for Ctrl+C
        if signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal (Ctrl+C)");
            shutdown_handle.shutdown().await;
        }
    });

    // Run consumer (blocks until shutdown)
    info!("Starting to consume messages... Press Ctrl+C to stop");
    consumer.run().await?;

    info!("Consumer shut down gracefully");
    Ok(())
}
