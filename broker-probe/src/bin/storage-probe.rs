//! storage-probe - exercises the ingest pipeline end to end
//!
//! Publishes batches of randomized readings, a multi-device pass, and one
//! above-threshold reading that should provoke an alert on the server side.

use anyhow::Context;
use clap::Parser;
use rumqttc::{AsyncClient, Event, Incoming, MqttOptions, QoS};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::sleep;
use tracing::{error, info};

use airq_telemetry::{generate, TopicSet, FORMALDEHYDE_WARNING};

#[derive(Parser)]
#[command(name = "storage-probe")]
#[command(about = "Exercises the sensor-data ingest pipeline of the air-quality backend")]
struct Args {
    /// MQTT broker host
    #[arg(long, default_value = "localhost")]
    host: String,

    /// MQTT broker port
    #[arg(long, default_value_t = 1883)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    info!("🧪 Storage probe against {}:{}", args.host, args.port);

    let mut mqttoptions = MqttOptions::new("storage-probe", &args.host, args.port);
    mqttoptions.set_keep_alive(Duration::from_secs(30));
    mqttoptions.set_clean_session(true);

    let (client, eventloop) = AsyncClient::new(mqttoptions, 10);

    let (connected_tx, connected_rx) = oneshot::channel();
    tokio::spawn(drive_event_loop(eventloop, connected_tx));

    tokio::time::timeout(Duration::from_secs(10), connected_rx)
        .await
        .ok()
        .and_then(|r| r.ok())
        .with_context(|| format!("could not connect to {}:{}", args.host, args.port))?;
    info!("✅ Connected");

    // Pass 1: a batch of readings for one device
    info!("📊 Pass 1: publishing 5 readings for hcho_001");
    publish_batch(&client, "hcho_001", 5).await?;
    sleep(Duration::from_secs(3)).await;

    // Pass 2: several devices reporting
    info!("📱 Pass 2: multi-device publish");
    for device_id in ["hcho_001", "hcho_002", "hcho_003"] {
        info!("   device {}", device_id);
        publish_batch(&client, device_id, 3).await?;
        sleep(Duration::from_secs(1)).await;
    }
    sleep(Duration::from_secs(3)).await;

    // Pass 3: an above-threshold reading that should raise an alert
    info!("🚨 Pass 3: alert-condition reading");
    publish_alert_reading(&client).await?;

    info!("🎉 All passes complete");
    println!();
    println!("📋 Follow-up checks:");
    println!("   1. the server log shows the messages arriving");
    println!("   2. the readings landed in the database");
    println!("   3. an alert record exists for the high reading");
    println!("   4. the device statuses were refreshed");

    client.disconnect().await?;
    sleep(Duration::from_millis(100)).await;

    Ok(())
}

async fn drive_event_loop(mut eventloop: rumqttc::EventLoop, connected_tx: oneshot::Sender<()>) {
    let mut connected_tx = Some(connected_tx);
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                if let Some(tx) = connected_tx.take() {
                    let _ = tx.send(());
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

/// Publish `count` randomized readings for a device, two seconds apart
async fn publish_batch(client: &AsyncClient, device_id: &str, count: u32) -> anyhow::Result<()> {
    let topics = TopicSet::hcho(device_id);

    for i in 1..=count {
        let reading = generate::reading(device_id, airq_telemetry::DEFAULT_DEVICE_TYPE);

        info!(
            "   reading {}/{}: formaldehyde {} mg/m³, {} °C, {} %RH, battery {} %, {} dBm",
            i,
            count,
            reading.data.formaldehyde,
            reading.data.temperature,
            reading.data.humidity,
            reading.data.battery,
            reading.quality.signal_strength
        );

        client
            .publish(
                topics.data(),
                QoS::AtLeastOnce,
                false,
                serde_json::to_string(&reading)?,
            )
            .await
            .with_context(|| format!("failed to publish reading for {}", device_id))?;

        if i < count {
            sleep(Duration::from_secs(2)).await;
        }
    }

    info!("   ✅ {} readings published for {}", count, device_id);
    Ok(())
}

/// Publish one reading above the warning threshold to provoke an alert
async fn publish_alert_reading(client: &AsyncClient) -> anyhow::Result<()> {
    let topics = TopicSet::hcho("hcho_001");
    let mut reading = generate::reading("hcho_001", airq_telemetry::DEFAULT_DEVICE_TYPE);
    reading.data.formaldehyde = 0.12;
    reading.data.temperature = 25.0;
    reading.data.humidity = 50.0;
    reading.quality.data_quality = airq_telemetry::alert::data_quality(0.12).to_string();

    info!(
        "   formaldehyde {} mg/m³ (warning threshold {})",
        reading.data.formaldehyde, FORMALDEHYDE_WARNING
    );

    client
        .publish(
            topics.data(),
            QoS::AtLeastOnce,
            false,
            serde_json::to_string(&reading)?,
        )
        .await
        .context("failed to publish alert reading")?;

    info!("   ✅ Alert reading published");
    Ok(())
}
