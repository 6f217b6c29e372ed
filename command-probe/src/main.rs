use anyhow::{bail, Context};
use chrono::{DateTime, Local};
use clap::Parser;
use log::{error, info, warn};
use rumqttc::{AsyncClient, Event, Incoming, MqttOptions, QoS};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tokio::time::sleep;

use airq_telemetry::{generate, CommandAction, CommandReply, ConfigPush, TopicSet};

#[cfg(test)]
mod tests;

#[derive(Parser)]
#[command(name = "command-probe")]
#[command(about = "Exercises config pushes, command dispatch and device replies over MQTT")]
struct Args {
    /// MQTT broker host
    #[arg(long, default_value = "localhost")]
    host: String,

    /// MQTT broker port
    #[arg(long, default_value_t = 1883)]
    port: u16,

    /// MQTT username
    #[arg(long, default_value = "admin")]
    username: String,

    /// MQTT password
    #[arg(long, default_value = "password")]
    password: String,

    /// Device ID
    #[arg(short, long, default_value = "hcho_001")]
    device_id: String,

    /// Which phase to run: config, command, response or all
    #[arg(long, default_value = "all")]
    test_type: String,

    /// Command to dispatch: calibrate, reboot, get_config or update_config
    #[arg(long, default_value = "calibrate")]
    command: String,
}

/// A message picked up on the response topic
#[derive(Debug, Clone)]
struct ReceivedMessage {
    topic: String,
    payload: serde_json::Value,
    received_at: DateTime<Local>,
}

/// Parse an incoming publish into a report entry. Non-JSON payloads are
/// dropped with a warning.
fn parse_incoming(topic: &str, payload: &[u8]) -> Option<ReceivedMessage> {
    match serde_json::from_slice(payload) {
        Ok(value) => Some(ReceivedMessage {
            topic: topic.to_string(),
            payload: value,
            received_at: Local::now(),
        }),
        Err(e) => {
            warn!("Could not parse message on {}: {}", topic, e);
            None
        }
    }
}

const TEST_TYPES: [&str; 4] = ["config", "command", "response", "all"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // info-level output by default so the tool is usable without RUST_LOG
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if !TEST_TYPES.contains(&args.test_type.as_str()) {
        bail!(
            "unknown test type '{}', expected one of: {}",
            args.test_type,
            TEST_TYPES.join(", ")
        );
    }
    let action: CommandAction = args
        .command
        .parse()
        .context("--command must be one of: calibrate, reboot, get_config, update_config")?;

    info!("🚀 Command probe for device: {}", args.device_id);
    info!("🌐 MQTT broker: {}:{}", args.host, args.port);

    let topics = TopicSet::hcho(&args.device_id);
    let received: Arc<Mutex<Vec<ReceivedMessage>>> = Arc::new(Mutex::new(Vec::new()));

    let mut mqttoptions = MqttOptions::new(
        format!("command-probe-{}", args.device_id),
        &args.host,
        args.port,
    );
    mqttoptions.set_credentials(&args.username, &args.password);
    mqttoptions.set_keep_alive(Duration::from_secs(30));
    mqttoptions.set_clean_session(true);

    let (client, eventloop) = AsyncClient::new(mqttoptions, 10);

    let (connected_tx, connected_rx) = oneshot::channel();
    tokio::spawn(run_event_loop(
        client.clone(),
        eventloop,
        topics.response(),
        Arc::clone(&received),
        connected_tx,
    ));

    tokio::time::timeout(Duration::from_secs(10), connected_rx)
        .await
        .ok()
        .and_then(|r| r.ok())
        .with_context(|| {
            format!(
                "could not connect to {}:{} within 10 seconds",
                args.host, args.port
            )
        })?;
    info!("✅ Connected to MQTT broker at {}:{}", args.host, args.port);

    let run_all = args.test_type == "all";

    if run_all || args.test_type == "config" {
        push_config(&client, &topics, &args.device_id).await?;
        sleep(Duration::from_secs(2)).await;
    }

    if run_all || args.test_type == "command" {
        dispatch_command(&client, &topics, &args.device_id, action).await?;
        sleep(Duration::from_secs(2)).await;
    }

    if run_all || args.test_type == "response" {
        simulate_reply(&client, &topics, &args.device_id, action).await?;
        sleep(Duration::from_secs(2)).await;
    }

    info!("⏳ Listening for responses...");
    sleep(Duration::from_secs(5)).await;

    print_report(&received.lock().await);

    client.disconnect().await?;
    sleep(Duration::from_millis(100)).await;
    info!("🔌 Disconnected");

    Ok(())
}

async fn run_event_loop(
    client: AsyncClient,
    mut eventloop: rumqttc::EventLoop,
    response_topic: String,
    received: Arc<Mutex<Vec<ReceivedMessage>>>,
    connected_tx: oneshot::Sender<()>,
) {
    let mut connected_tx = Some(connected_tx);
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                if let Err(e) = client.subscribe(&response_topic, QoS::AtLeastOnce).await {
                    error!("Failed to subscribe to {}: {}", response_topic, e);
                } else {
                    info!("📡 Subscribed to response topic: {}", response_topic);
                }
                if let Some(tx) = connected_tx.take() {
                    let _ = tx.send(());
                }
            }
            Ok(Event::Incoming(Incoming::Publish(p))) => {
                if let Some(message) = parse_incoming(&p.topic, &p.payload) {
                    info!("📨 Message on {}", message.topic);
                    received.lock().await.push(message);
                }
            }
            Ok(_) => {}
            Err(e) => {
                error!("MQTT connection error: {:?}", e);
                sleep(Duration::from_secs(5)).await;
            }
        }
    }
}

/// Push the standard device configuration on the config topic
async fn push_config(
    client: &AsyncClient,
    topics: &TopicSet,
    device_id: &str,
) -> anyhow::Result<()> {
    info!("🔧 Pushing configuration to {}", device_id);
    let push = ConfigPush::standard(device_id, generate::unix_ts());
    publish_json(client, &topics.config(), &push).await
}

/// Dispatch a command request on the command topic
async fn dispatch_command(
    client: &AsyncClient,
    topics: &TopicSet,
    device_id: &str,
    action: CommandAction,
) -> anyhow::Result<()> {
    info!("⚡ Dispatching command to {}: {}", device_id, action);
    let request = action.request(device_id, generate::unix_ts());
    publish_json(client, &topics.command(), &request).await
}

/// Play the device side: publish the canned reply for a command
async fn simulate_reply(
    client: &AsyncClient,
    topics: &TopicSet,
    device_id: &str,
    action: CommandAction,
) -> anyhow::Result<()> {
    info!("📨 Simulating device reply for: {}", action);
    let reply = CommandReply::for_action(device_id, action.as_str(), generate::unix_ts());
    publish_json(client, &topics.response(), &reply).await
}

async fn publish_json<T: serde::Serialize>(
    client: &AsyncClient,
    topic: &str,
    payload: &T,
) -> anyhow::Result<()> {
    let json = serde_json::to_string(payload)?;
    client
        .publish(topic, QoS::AtLeastOnce, false, json)
        .await
        .with_context(|| format!("failed to publish to {}", topic))?;
    info!("📤 Published to {}", topic);
    Ok(())
}

fn print_report(messages: &[ReceivedMessage]) {
    if messages.is_empty() {
        println!("⚠️  No response messages received");
        return;
    }

    println!("📋 Received {} message(s):", messages.len());
    for (i, message) in messages.iter().enumerate() {
        println!();
        println!("Message {}:", i + 1);
        println!("  Topic: {}", message.topic);
        println!(
            "  Received: {}",
            message.received_at.format("%Y-%m-%d %H:%M:%S")
        );
        println!(
            "  Payload: {}",
            serde_json::to_string_pretty(&message.payload).unwrap_or_default()
        );
    }
}
