use clap::Parser;
use log::{error, info, warn};
use rand::Rng;
use rumqttc::{AsyncClient, Event, Incoming, MqttOptions, QoS};
use std::time::Duration;
use tokio::signal;
use tokio::sync::{broadcast, oneshot};
use tokio::time::{interval, sleep, MissedTickBehavior};

use airq_telemetry::{generate, TopicSet};

#[cfg(test)]
mod tests;

#[derive(Parser)]
#[command(name = "device-sim")]
#[command(about = "Simulates a formaldehyde sensor device publishing telemetry over MQTT")]
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

    /// Reporting interval in seconds (simulation mode)
    #[arg(short, long, default_value_t = 30)]
    interval: u64,

    /// Number of messages to send (single-shot mode)
    #[arg(short, long, default_value_t = 10)]
    count: u32,

    /// Subscribe to the device response topic and print incoming messages
    #[arg(long)]
    subscribe: bool,

    /// Keep publishing on the reporting interval until Ctrl+C
    #[arg(long)]
    simulate: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // info-level output by default so the tool is usable without RUST_LOG
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    info!("🚀 Starting device simulator for device: {}", args.device_id);
    info!("🌐 MQTT broker: {}:{}", args.host, args.port);

    let topics = TopicSet::hcho(&args.device_id);

    let mut mqttoptions = MqttOptions::new(&args.device_id, &args.host, args.port);
    mqttoptions.set_credentials(&args.username, &args.password);
    mqttoptions.set_keep_alive(Duration::from_secs(30));
    mqttoptions.set_clean_session(true);

    let (client, eventloop) = AsyncClient::new(mqttoptions, 10);

    // The event loop task owns the connection: it confirms the initial
    // ConnAck, installs the response subscription, and prints whatever the
    // server sends back.
    let (connected_tx, connected_rx) = oneshot::channel();
    let response_topic = args.subscribe.then(|| topics.response());
    tokio::spawn(run_event_loop(
        client.clone(),
        eventloop,
        response_topic,
        connected_tx,
    ));

    match tokio::time::timeout(Duration::from_secs(10), connected_rx).await {
        Ok(Ok(())) => {
            info!("✅ Connected to MQTT broker at {}:{}", args.host, args.port);
        }
        _ => {
            error!(
                "❌ Could not connect to {}:{} within 10 seconds",
                args.host, args.port
            );
            return Err("connection timeout".into());
        }
    }

    if args.simulate {
        // Create shutdown signal channel
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        tokio::spawn(async move {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to listen for ctrl-c signal: {}", e);
                return;
            }
            info!("🛑 Received CTRL+C, stopping simulation...");
            let _ = shutdown_tx.send(());
        });

        info!(
            "🔄 Simulation mode: reporting every {}s, press Ctrl+C to stop",
            args.interval
        );
        run_simulation(&client, &topics, &args.device_id, args.interval, shutdown_rx).await;
    } else {
        run_batch(&client, &topics, &args.device_id, args.count).await;
    }

    client.disconnect().await?;
    // give the disconnect packet a moment to leave
    sleep(Duration::from_millis(100)).await;
    info!("🔌 Disconnected");

    Ok(())
}

/// Drive the MQTT event loop for the lifetime of the process
async fn run_event_loop(
    client: AsyncClient,
    mut eventloop: rumqttc::EventLoop,
    response_topic: Option<String>,
    connected_tx: oneshot::Sender<()>,
) {
    let mut connected_tx = Some(connected_tx);
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                if let Some(topic) = &response_topic {
                    if let Err(e) = client.subscribe(topic, QoS::AtLeastOnce).await {
                        error!("Failed to subscribe to {}: {}", topic, e);
                    } else {
                        info!("📡 Subscribed to response topic: {}", topic);
                    }
                }
                if let Some(tx) = connected_tx.take() {
                    let _ = tx.send(());
                }
            }
            Ok(Event::Incoming(Incoming::Publish(p))) => {
                match serde_json::from_slice::<serde_json::Value>(&p.payload) {
                    Ok(value) => {
                        info!("📨 Message on {}:", p.topic);
                        println!(
                            "{}",
                            serde_json::to_string_pretty(&value).unwrap_or_default()
                        );
                    }
                    Err(e) => {
                        warn!("Could not parse message on {}: {}", p.topic, e);
                    }
                }
            }
            Ok(Event::Incoming(Incoming::SubAck(_))) => {
                info!("Subscription acknowledged");
            }
            Ok(_) => {}
            Err(e) => {
                error!("MQTT connection error: {:?}", e);
                info!("Reconnecting in 5 seconds...");
                sleep(Duration::from_secs(5)).await;
            }
        }
    }
}

/// Single-shot mode: publish a fixed number of readings one second apart,
/// each with a 50% chance of an accompanying status message
async fn run_batch(client: &AsyncClient, topics: &TopicSet, device_id: &str, count: u32) {
    info!("🧪 Single-shot mode: sending {} readings...", count);

    for i in 1..=count {
        let reading = generate::reading(device_id, airq_telemetry::DEFAULT_DEVICE_TYPE);
        publish_json(client, &topics.data(), &reading).await;
        info!(
            "📤 Reading {}/{}: formaldehyde {} mg/m³",
            i, count, reading.data.formaldehyde
        );

        if rand::thread_rng().gen_bool(0.5) {
            let status = generate::status(device_id, airq_telemetry::DEFAULT_DEVICE_TYPE);
            publish_json(client, &topics.status(), &status).await;
            info!("📤 Status update for {}", device_id);
        }

        sleep(Duration::from_secs(1)).await;
    }

    info!("✅ Batch complete: {} readings sent", count);
}

/// Simulation mode: publish on the reporting interval until shutdown,
/// with a 30% chance of a status message per tick
async fn run_simulation(
    client: &AsyncClient,
    topics: &TopicSet,
    device_id: &str,
    interval_secs: u64,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let mut tick = interval(Duration::from_secs(interval_secs.max(1)));
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = tick.tick() => {
                let reading = generate::reading(device_id, airq_telemetry::DEFAULT_DEVICE_TYPE);
                publish_json(client, &topics.data(), &reading).await;
                info!(
                    "📤 Published reading: formaldehyde {} mg/m³",
                    reading.data.formaldehyde
                );

                if rand::thread_rng().gen_bool(0.3) {
                    let status = generate::status(device_id, airq_telemetry::DEFAULT_DEVICE_TYPE);
                    publish_json(client, &topics.status(), &status).await;
                    info!("📤 Published status update");
                }
            }
            _ = shutdown_rx.recv() => {
                info!("🛑 Simulation stopped for device {}", device_id);
                break;
            }
        }
    }
}

/// Publish a payload at QoS 1, logging instead of aborting on failure
async fn publish_json<T: serde::Serialize>(client: &AsyncClient, topic: &str, payload: &T) {
    match serde_json::to_string(payload) {
        Ok(json) => {
            if let Err(e) = client.publish(topic, QoS::AtLeastOnce, false, json).await {
                warn!("Failed to publish to {}: {}", topic, e);
            }
        }
        Err(e) => {
            warn!("Failed to serialize payload for {}: {}", topic, e);
        }
    }
}
