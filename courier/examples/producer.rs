//! Example producer demonstrating type-safe message sending.
//!
//! This example shows how to:
//! - Define message types with the CourierMessage trait
//! - Create a Producer instance
//! - Send typed messages
//! - Use message keys for partition affinity
//! - Inspect topics through the connection registry
//!
//! To run this example:
//! ```bash
//! cargo run --example producer
//! ```

use courier::{CourierMessage, Producer, TopicConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, Level};

/// Example message type for user creation events
#[derive(Debug, Serialize, Deserialize)]
struct UserCreated {
    user_id: String,
    email: String,
    name: String,
    timestamp: u64,
}

impl CourierMessage for UserCreated {
    const TOPIC: &'static str = "user.created";
}

/// Example message type for order placement events
#[derive(Debug, Serialize, Deserialize)]
struct OrderPlaced {
    order_id: String,
    user_id: String,
    amount: f64,
    items: Vec<String>,
}

impl CourierMessage for OrderPlaced {
    const TOPIC: &'static str = "order.placed";
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("Starting producer example");

    // Get broker address from environment or use default
    let brokers =
        std::env::var("COURIER_BROKERS").unwrap_or_else(|_| "localhost:9092".to_string());

    // Create producer
    let producer = Producer::new(&brokers)?;
    info!("Producer created successfully");

    // Send some user created events
    for i in 1..=5 {
        let user = UserCreated {
            user_id: format!("user-{}", i),
            email: format!("user{}@example.com", i),
            name: format!("User {}", i),
            timestamp: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
        };

        info!("Sending UserCreated event for user_id: {}", user.user_id);
        producer.send(&user).await?;

        // Small delay between messages
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    // Send order events with keys for partition affinity
    for i in 1..=3 {
        let order = OrderPlaced {
            order_id: format!("order-{}", i),
            user_id: format!("user-{}", i),
            amount: 99.99 * i as f64,
            items: vec![format!("item-{}", i), format!("item-{}", i + 1)],
        };

        info!("Sending OrderPlaced event for order_id: {}", order.order_id);
        // Use user_id as key so all orders for the same user share a partition
        producer
            .send_with_key(&order, &order.user_id)
            .await?;

        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    // Flush any remaining messages
    info!("Flushing pending messages");
    producer.flush(Duration::from_secs(5))?;

    // Inspect what the session now owns. Creating a topic that already
    // exists with the same overlay coalesces to the same logical topic.
    let connection = producer.connection();
    for name in connection.topic_names() {
        let topic = connection.create_topic(&name, TopicConfig::new())?;
        let native = topic.native_handle()?;
        info!(
            "Topic '{}' holds {} record(s)",
            topic.name(),
            native.high_watermark()
        );
    }

    info!("All messages sent successfully!");
    Ok(())
}
