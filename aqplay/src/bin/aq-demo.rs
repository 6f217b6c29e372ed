//! aq-demo - guided tour of the air-quality MQTT tools
//!
//! Walks through the toolkit one demo at a time, spawning the sibling
//! binaries as subprocesses the way an operator would run them by hand.

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::net::TcpStream;
use tokio::process::Command as TokioCommand;
use tokio::signal;

use aqplay::TestConfig;

/// Configuration file used by the config-driven demo
const DEMO_CONFIG: &str = "test-configs/default.json";

type StdinLines = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    print_banner();

    if !check_dependencies().await? {
        return Err("dependency check failed".into());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        println!();
        println!("============================================================");
        println!("Pick a demo:");
        println!("1. Basic test - send a few readings");
        println!("2. Command round-trip - config push, command, device reply");
        println!("3. Config-driven scenario");
        println!("4. Continuous simulation");
        println!("5. Help");
        println!("6. Quit");
        println!("============================================================");

        let Some(choice) = prompt(&mut lines, "Enter a choice (1-6): ").await? else {
            break;
        };

        match choice.trim() {
            "1" => demo_basic(&mut lines).await?,
            "2" => demo_command_roundtrip(&mut lines).await?,
            "3" => demo_config_driven(&mut lines).await?,
            "4" => demo_simulation(&mut lines).await?,
            "5" => show_help(),
            "6" => {
                println!();
                println!("👋 Thanks for trying the MQTT test tools!");
                break;
            }
            _ => println!("❌ Invalid choice, enter a number between 1 and 6"),
        }
    }

    Ok(())
}

fn print_banner() {
    println!("============================================================");
    println!("    Air-quality MQTT test tools demo");
    println!("============================================================");
}

/// Make sure the demos can actually run before showing the menu
async fn check_dependencies() -> Result<bool, Box<dyn std::error::Error>> {
    println!();
    println!("📋 Checking prerequisites");
    println!("----------------------------------------");

    match TokioCommand::new("cargo").arg("--version").output().await {
        Ok(output) if output.status.success() => {
            println!("✅ {}", String::from_utf8_lossy(&output.stdout).trim());
        }
        _ => {
            println!("❌ cargo is not available on PATH");
            return Ok(false);
        }
    }

    if is_port_occupied("localhost", 1883).await {
        println!("✅ MQTT broker reachable on localhost:1883");
    } else {
        println!("⚠️  Nothing is listening on localhost:1883");
        println!("   Start your MQTT broker before running the demos");
    }

    Ok(true)
}

async fn is_port_occupied(host: &str, port: u16) -> bool {
    TcpStream::connect(format!("{}:{}", host, port)).await.is_ok()
}

async fn demo_basic(lines: &mut StdinLines) -> Result<(), Box<dyn std::error::Error>> {
    println!();
    println!("📋 Basic test demo");
    println!("----------------------------------------");
    println!("Sends 3 test readings to the broker on localhost:1883.");

    if wait_for_enter(lines).await?.is_none() {
        return Ok(());
    }

    run_tool(
        "Sending 3 test readings",
        "airq-device-sim",
        "device-sim",
        &["--count", "3", "--device-id", "demo_device_001"],
    )
    .await
}

async fn demo_command_roundtrip(lines: &mut StdinLines) -> Result<(), Box<dyn std::error::Error>> {
    println!();
    println!("📋 Command round-trip demo");
    println!("----------------------------------------");
    println!("Pushes a configuration, dispatches a command and simulates the");
    println!("device reply, then reports everything heard on the response topic.");

    if wait_for_enter(lines).await?.is_none() {
        return Ok(());
    }

    run_tool(
        "Running the full command round-trip",
        "airq-command-probe",
        "command-probe",
        &["--test-type", "all", "--device-id", "demo_device_002"],
    )
    .await
}

async fn demo_config_driven(lines: &mut StdinLines) -> Result<(), Box<dyn std::error::Error>> {
    println!();
    println!("📋 Config-driven scenario demo");
    println!("----------------------------------------");
    println!("Configuration file: {}", DEMO_CONFIG);

    // Preview what the configuration defines
    match tokio::fs::read_to_string(DEMO_CONFIG).await {
        Ok(content) => match aqplay::parse_json_config(&content) {
            Ok(config) => print_config_preview(&config),
            Err(e) => println!("⚠️  Could not parse {}: {}", DEMO_CONFIG, e),
        },
        Err(e) => println!("⚠️  Could not read {}: {}", DEMO_CONFIG, e),
    }

    if wait_for_enter(lines).await?.is_none() {
        return Ok(());
    }

    run_tool(
        "Replaying scenario 1 against broker 1",
        "aqplay",
        "aqplay",
        &[DEMO_CONFIG, "--broker", "1", "--scenario", "1"],
    )
    .await
}

async fn demo_simulation(lines: &mut StdinLines) -> Result<(), Box<dyn std::error::Error>> {
    println!();
    println!("📋 Continuous simulation demo");
    println!("----------------------------------------");
    println!("Starts a device publishing every 10 seconds.");
    println!("Press Ctrl+C to stop the simulation and return to the menu.");

    if wait_for_enter(lines).await?.is_none() {
        return Ok(());
    }

    run_tool(
        "Starting continuous simulation",
        "airq-device-sim",
        "device-sim",
        &[
            "--simulate",
            "--interval",
            "10",
            "--device-id",
            "demo_device_003",
        ],
    )
    .await
}

fn print_config_preview(config: &TestConfig) {
    println!();
    println!("📄 Configuration preview:");
    println!("   MQTT brokers:     {}", config.mqtt_brokers.len());
    println!("   test scenarios:   {}", config.test_scenarios.len());
    println!("   device templates: {}", config.device_templates.len());
}

fn show_help() {
    println!();
    println!("📋 Help");
    println!("----------------------------------------");
    println!("Available tools:");
    println!("1. device-sim     - basic device exerciser (batch or continuous)");
    println!("2. command-probe  - config/command/response round-trips");
    println!("3. quick-check    - one-shot data-path smoke test");
    println!("4. storage-probe  - ingest pipeline exercise incl. alert case");
    println!("5. auth-probe     - credential scenario matrix");
    println!("6. aqplay         - config-driven scenario player");

    println!();
    println!("Common invocations:");
    println!("• cargo run -p airq-device-sim --bin device-sim -- --count 10");
    println!("• cargo run -p airq-device-sim --bin device-sim -- --simulate");
    println!("• cargo run -p airq-command-probe --bin command-probe -- --test-type all");
    println!("• cargo run -p aqplay --bin aqplay -- --interactive");

    println!();
    println!("MQTT topic family:");
    println!("• data:     air-quality/hcho/{{device_id}}/data");
    println!("• status:   air-quality/hcho/{{device_id}}/status");
    println!("• config:   air-quality/hcho/{{device_id}}/config");
    println!("• command:  air-quality/hcho/{{device_id}}/command");
    println!("• response: air-quality/hcho/{{device_id}}/response");
}

/// Spawn a sibling tool and stream its output; Ctrl+C stops the tool, not
/// the demo
async fn run_tool(
    description: &str,
    package: &str,
    bin: &str,
    args: &[&str],
) -> Result<(), Box<dyn std::error::Error>> {
    println!();
    println!("🚀 {}", description);
    println!(
        "   cargo run -p {} --bin {} -- {}",
        package,
        bin,
        args.join(" ")
    );
    println!();

    let mut child = TokioCommand::new("cargo")
        .args(["run", "-p", package, "--bin", bin, "--"])
        .args(args)
        .env("RUST_LOG", "info")
        .spawn()
        .map_err(|e| format!("Failed to start {}: {}", bin, e))?;

    let outcome = tokio::select! {
        status = child.wait() => Some(status),
        _ = signal::ctrl_c() => None,
    };

    match outcome {
        Some(Ok(status)) if status.success() => println!("\n✅ {} finished successfully", bin),
        Some(Ok(status)) => println!("\n❌ {} exited with {}", bin, status),
        Some(Err(e)) => println!("\n❌ Failed to wait for {}: {}", bin, e),
        None => {
            println!();
            println!("🛑 Stopping {}...", bin);
            let _ = child.kill().await;
            // drain the exit status so the child is reaped
            let _ = child.wait().await;
        }
    }

    Ok(())
}

async fn prompt(
    lines: &mut StdinLines,
    message: &str,
) -> Result<Option<String>, Box<dyn std::error::Error>> {
    use std::io::Write;
    print!("\n{}", message);
    std::io::stdout().flush()?;
    Ok(lines.next_line().await?)
}

/// Returns None when stdin is closed
async fn wait_for_enter(
    lines: &mut StdinLines,
) -> Result<Option<String>, Box<dyn std::error::Error>> {
    prompt(lines, "Press Enter to start...").await
}
