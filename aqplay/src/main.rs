use clap::{Arg, Command};
use rumqttc::{AsyncClient, Event, Incoming, MqttOptions, QoS};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::oneshot;
use tokio::time::sleep;

use airq_telemetry::{generate, TopicSet};
use aqplay::{
    resolve_index, validate_config, BrokerConfig, DeviceTemplate, ScenarioConfig, TestConfig,
};

/// Default configuration shipped with the workspace
const DEFAULT_CONFIG: &str = "test-configs/default.json";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = Command::new("aqplay - Air-Quality MQTT Scenario Player")
        .version("1.0")
        .about("🎭 Replays configured air-quality test scenarios against MQTT brokers")
        .arg(
            Arg::new("config")
                .help("Path to test configuration file (JSON or RON)")
                .value_name("FILE")
                .index(1),
        )
        .arg(
            Arg::new("broker")
                .long("broker")
                .help("Broker number from the configuration (1-based)")
                .value_name("N")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("scenario")
                .long("scenario")
                .help("Scenario number from the configuration (1-based)")
                .value_name("N")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("list-brokers")
                .long("list-brokers")
                .help("List the configured MQTT brokers")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("list-scenarios")
                .long("list-scenarios")
                .help("List the configured test scenarios")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("validate")
                .long("validate")
                .help("Validate the configuration file without running")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("interactive")
                .long("interactive")
                .help("Interactive mode")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let config_path = PathBuf::from(
        matches
            .get_one::<String>("config")
            .map(String::as_str)
            .unwrap_or(DEFAULT_CONFIG),
    );

    let content = tokio::fs::read_to_string(&config_path)
        .await
        .map_err(|e| format!("Failed to read config file {}: {}", config_path.display(), e))?;

    // RON or JSON by extension, like the scenario files
    let config: TestConfig = if config_path.extension().and_then(|s| s.to_str()) == Some("ron") {
        aqplay::parse_ron_config(&content)?
    } else {
        aqplay::parse_json_config(&content)?
    };

    if matches.get_flag("validate") {
        validate_config(&config)?;
        println!("✅ Configuration is valid");
        return Ok(());
    }

    if matches.get_flag("list-brokers") {
        list_brokers(&config);
        return Ok(());
    }

    if matches.get_flag("list-scenarios") {
        list_scenarios(&config);
        return Ok(());
    }

    if matches.get_flag("interactive") {
        return interactive_mode(config).await;
    }

    // Command-line mode needs both numbers
    let (Some(&broker_number), Some(&scenario_number)) = (
        matches.get_one::<usize>("broker"),
        matches.get_one::<usize>("scenario"),
    ) else {
        eprintln!("❌ Provide --broker and --scenario, or use --interactive");
        return Err("broker and scenario required".into());
    };

    let broker = &config.mqtt_brokers[resolve_index(broker_number, config.mqtt_brokers.len())?];
    let scenario =
        &config.test_scenarios[resolve_index(scenario_number, config.test_scenarios.len())?];

    let session = BrokerSession::connect(broker).await?;
    let result = run_scenario(&session, scenario, &config.device_templates).await;
    session.disconnect().await;

    result
}

fn list_brokers(config: &TestConfig) {
    println!();
    println!("📋 Configured MQTT brokers:");
    for (i, broker) in config.mqtt_brokers.iter().enumerate() {
        println!("  {}. {}", i + 1, broker.name);
        println!("     address: {}:{}", broker.host, broker.port);
        println!("     {}", broker.description);
        println!();
    }
}

fn list_scenarios(config: &TestConfig) {
    println!();
    println!("📋 Configured test scenarios:");
    for (i, scenario) in config.test_scenarios.iter().enumerate() {
        println!("  {}. {}", i + 1, scenario.name);
        println!("     {}", scenario.description);
        println!(
            "     devices: {}, interval: {}s, duration: {}s",
            scenario.device_count, scenario.message_interval, scenario.test_duration
        );
        println!();
    }
}

/// A connected broker: the client plus the background task driving its
/// event loop
struct BrokerSession {
    name: String,
    client: AsyncClient,
    task: tokio::task::JoinHandle<()>,
}

impl BrokerSession {
    async fn connect(broker: &BrokerConfig) -> Result<Self, Box<dyn std::error::Error>> {
        println!(
            "🔗 Connecting to {}: {}:{}...",
            broker.name, broker.host, broker.port
        );

        let mut mqttoptions = MqttOptions::new(
            format!("aqplay-{}", broker.name),
            &broker.host,
            broker.port,
        );
        mqttoptions.set_keep_alive(Duration::from_secs(30));
        mqttoptions.set_clean_session(true);
        if !broker.username.is_empty() {
            mqttoptions.set_credentials(&broker.username, &broker.password);
        }

        let (client, mut eventloop) = AsyncClient::new(mqttoptions, 10);

        let (connected_tx, connected_rx) = oneshot::channel();
        let broker_name = broker.name.clone();
        let task = tokio::spawn(async move {
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
                        eprintln!("❌ Broker {}: connection error: {}", broker_name, e);
                        sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        });

        match tokio::time::timeout(Duration::from_secs(10), connected_rx).await {
            Ok(Ok(())) => {
                println!("✅ Connected to {}", broker.name);
                Ok(Self {
                    name: broker.name.clone(),
                    client,
                    task,
                })
            }
            _ => {
                task.abort();
                Err(format!(
                    "Could not connect to {} ({}:{}) within 10 seconds",
                    broker.name, broker.host, broker.port
                )
                .into())
            }
        }
    }

    async fn disconnect(self) {
        if let Err(e) = self.client.disconnect().await {
            eprintln!("❌ Failed to disconnect from {}: {}", self.name, e);
        } else {
            println!("🔌 Disconnected from {}", self.name);
        }
        // let the disconnect packet leave, then stop the event-loop task so
        // it cannot reconnect under the same client id
        sleep(Duration::from_millis(100)).await;
        self.task.abort();
    }
}

/// Replay one scenario against a connected broker
async fn run_scenario(
    session: &BrokerSession,
    scenario: &ScenarioConfig,
    templates: &[DeviceTemplate],
) -> Result<(), Box<dyn std::error::Error>> {
    println!();
    println!("🧪 Running scenario: {}", scenario.name);
    println!("   {}", scenario.description);
    println!(
        "   devices: {}, interval: {}s, duration: {}s",
        scenario.device_count, scenario.message_interval, scenario.test_duration
    );
    println!();

    if scenario.device_count > templates.len() {
        return Err(format!(
            "Scenario '{}' wants {} devices but only {} templates are defined",
            scenario.name,
            scenario.device_count,
            templates.len()
        )
        .into());
    }
    let selected = &templates[..scenario.device_count];

    let start = Instant::now();
    let duration = Duration::from_secs(scenario.test_duration);
    let mut sent: u64 = 0;

    let shutdown = signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut interrupted = false;
    while start.elapsed() < duration && !interrupted {
        for template in selected {
            match publish_reading(session, template).await {
                Ok(()) => sent += 1,
                Err(e) => eprintln!(
                    "❌ Broker {}: failed to publish for {}: {}",
                    session.name, template.device_id, e
                ),
            }
        }

        // interval 0 means a single burst
        if scenario.message_interval == 0 {
            break;
        }

        tokio::select! {
            _ = &mut shutdown => {
                println!();
                println!("🛑 Scenario interrupted");
                interrupted = true;
            }
            _ = sleep(Duration::from_secs(scenario.message_interval)) => {}
        }
    }

    println!();
    println!("✅ Scenario complete: {}", scenario.name);
    println!("   messages sent: {}", sent);
    println!("   elapsed: {:.1}s", start.elapsed().as_secs_f64());
    println!(
        "   finished at: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );

    Ok(())
}

/// Publish one randomized reading for a device template
async fn publish_reading(
    session: &BrokerSession,
    template: &DeviceTemplate,
) -> Result<(), Box<dyn std::error::Error>> {
    let reading = generate::reading_at(
        &template.device_id,
        &template.device_type,
        template.sensor_id.as_deref(),
        template.sensor_type.as_deref(),
        template.location.clone(),
    );

    let topics = TopicSet::new(&template.device_type, &template.device_id);
    session
        .client
        .publish(
            topics.data(),
            QoS::AtLeastOnce,
            false,
            serde_json::to_string(&reading)?,
        )
        .await?;

    println!(
        "📤 {} <- {} (formaldehyde {} mg/m³)",
        session.name, template.device_id, reading.data.formaldehyde
    );
    Ok(())
}

/// Line-based interactive mode
async fn interactive_mode(config: TestConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("🎮 Interactive mode");
    println!("Type 'help' to see the available commands");

    use std::io::Write;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut sessions: Vec<BrokerSession> = Vec::new();

    loop {
        print!("\n> ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = signal::ctrl_c() => {
                println!();
                println!("🛑 Interrupted");
                break;
            }
        };
        let Some(line) = line else {
            break;
        };
        let line = line.trim().to_lowercase();

        match line.as_str() {
            "" => {}
            "help" => {
                println!();
                println!("Available commands:");
                println!("  brokers            - list the configured MQTT brokers");
                println!("  scenarios          - list the configured test scenarios");
                println!("  connect <number>   - connect to a broker");
                println!("  run <number>       - run a scenario on the first connected broker");
                println!("  disconnect         - drop all broker connections");
                println!("  quit               - leave interactive mode");
            }
            "brokers" => list_brokers(&config),
            "scenarios" => list_scenarios(&config),
            "disconnect" => disconnect_all(&mut sessions).await,
            "quit" => break,
            _ if line.starts_with("connect ") => {
                match parse_number(&line, config.mqtt_brokers.len()) {
                    Ok(index) => match BrokerSession::connect(&config.mqtt_brokers[index]).await {
                        Ok(session) => sessions.push(session),
                        Err(e) => println!("❌ {}", e),
                    },
                    Err(e) => println!("❌ {}", e),
                }
            }
            _ if line.starts_with("run ") => {
                match parse_number(&line, config.test_scenarios.len()) {
                    Ok(index) => {
                        if let Some(session) = sessions.first() {
                            let scenario = &config.test_scenarios[index];
                            if let Err(e) =
                                run_scenario(session, scenario, &config.device_templates).await
                            {
                                println!("❌ Scenario failed: {}", e);
                            }
                        } else {
                            println!("❌ Connect to a broker first");
                        }
                    }
                    Err(e) => println!("❌ {}", e),
                }
            }
            _ => println!("❌ Unknown command, type 'help' to see what is available"),
        }
    }

    disconnect_all(&mut sessions).await;
    Ok(())
}

/// Parse the numeric argument of a `connect N` / `run N` command
fn parse_number(line: &str, len: usize) -> Result<usize, String> {
    let arg = line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| "Missing number argument".to_string())?;
    let number: usize = arg
        .parse()
        .map_err(|_| format!("'{}' is not a number", arg))?;
    resolve_index(number, len)
}

async fn disconnect_all(sessions: &mut Vec<BrokerSession>) {
    for session in sessions.drain(..) {
        session.disconnect().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number_valid() {
        assert_eq!(parse_number("connect 2", 3).unwrap(), 1);
        assert_eq!(parse_number("run 1", 1).unwrap(), 0);
    }

    #[test]
    fn test_parse_number_missing_argument() {
        assert!(parse_number("connect", 3).is_err());
    }

    #[test]
    fn test_parse_number_not_numeric() {
        assert!(parse_number("connect two", 3).is_err());
    }

    #[test]
    fn test_parse_number_out_of_range() {
        assert!(parse_number("connect 4", 3).is_err());
        assert!(parse_number("connect 0", 3).is_err());
    }
}
