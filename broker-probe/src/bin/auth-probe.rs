//! auth-probe - runs a matrix of credential scenarios against the broker
//!
//! Each case opens a fresh connection with a different credential shape and,
//! when the broker lets it in, publishes a small probe payload at QoS 1.
//! The closing summary says whether the broker enforces authentication.

use clap::Parser;
use rumqttc::{AsyncClient, ConnectReturnCode, ConnectionError, Event, Incoming, MqttOptions, QoS};
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::info;
use uuid::Uuid;

use airq_telemetry::generate;

const PROBE_TOPIC: &str = "air-quality/hcho/test_auth/data";

#[derive(Parser)]
#[command(name = "auth-probe")]
#[command(about = "Tests which credential shapes the MQTT broker accepts")]
struct Args {
    /// MQTT broker host
    #[arg(long, default_value = "localhost")]
    host: String,

    /// MQTT broker port
    #[arg(long, default_value_t = 1883)]
    port: u16,
}

/// One credential shape to try
struct AuthScenario {
    name: &'static str,
    username: Option<String>,
    password: Option<String>,
    client_id: Option<&'static str>,
}

impl AuthScenario {
    fn credentials(
        name: &'static str,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name,
            username: Some(username.into()),
            password: Some(password.into()),
            client_id: None,
        }
    }
}

/// The fixed scenario matrix, from no auth at all up to odd credential shapes
fn scenarios() -> Vec<AuthScenario> {
    vec![
        AuthScenario {
            name: "anonymous connection",
            username: None,
            password: None,
            client_id: None,
        },
        AuthScenario::credentials("empty username and password", "", ""),
        AuthScenario {
            name: "username only",
            username: Some("test_user".to_string()),
            password: None,
            client_id: None,
        },
        AuthScenario::credentials("username and password", "test_user", "test_pass"),
        AuthScenario::credentials("configured admin credentials", "admin", "password"),
        AuthScenario::credentials("wrong credentials", "wrong_user", "wrong_pass"),
        AuthScenario::credentials("special characters", "user@domain", "pass#123"),
        AuthScenario::credentials("long credentials", "a".repeat(100), "b".repeat(100)),
        AuthScenario::credentials("non-ascii credentials", "测试用户", "测试密码"),
        AuthScenario {
            name: "custom client id",
            username: None,
            password: None,
            client_id: Some("custom_client_123"),
        },
    ]
}

struct CaseResult {
    name: &'static str,
    passed: bool,
    reason: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    println!("============================================================");
    println!("🔐 MQTT authentication matrix against {}:{}", args.host, args.port);
    println!("============================================================");

    let mut results = Vec::new();
    for scenario in scenarios() {
        println!();
        println!("🧪 Case: {}", scenario.name);
        println!("   username:  {}", scenario.username.as_deref().unwrap_or("(none)"));
        println!(
            "   password:  {}",
            if scenario.password.is_some() { "***" } else { "(none)" }
        );
        println!(
            "   client id: {}",
            scenario.client_id.unwrap_or("(generated)")
        );

        let result = run_case(&args.host, args.port, &scenario).await;
        match &result {
            r if r.passed => println!("   ✅ passed: {}", r.reason),
            r => println!("   ❌ failed: {}", r.reason),
        }
        results.push(result);

        // let the previous session tear down before the next case
        sleep(Duration::from_secs(1)).await;
    }

    print_summary(&results);
}

/// Connect with the scenario's credentials; on success publish the probe
/// payload and wait for the acknowledgement
async fn run_case(host: &str, port: u16, scenario: &AuthScenario) -> CaseResult {
    let client_id = scenario
        .client_id
        .map(str::to_string)
        .unwrap_or_else(|| format!("auth-probe-{}", Uuid::new_v4().simple()));

    let mut mqttoptions = MqttOptions::new(client_id, host, port);
    mqttoptions.set_keep_alive(Duration::from_secs(5));
    if let Some(username) = &scenario.username {
        mqttoptions.set_credentials(username, scenario.password.clone().unwrap_or_default());
    }

    let (client, mut eventloop) = AsyncClient::new(mqttoptions, 10);

    let outcome = timeout(Duration::from_secs(5), async {
        let mut published = false;
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Incoming::ConnAck(ack))) => {
                    if ack.code != ConnectReturnCode::Success {
                        return Err(describe_refusal(ack.code).to_string());
                    }
                    info!("connected, publishing probe payload");
                    let payload = serde_json::json!({
                        "device_id": "test_auth",
                        "timestamp": generate::unix_ts(),
                        "test": scenario.name,
                        "formaldehyde": 0.05,
                    });
                    if let Err(e) = client
                        .publish(PROBE_TOPIC, QoS::AtLeastOnce, false, payload.to_string())
                        .await
                    {
                        return Err(format!("publish failed: {}", e));
                    }
                    published = true;
                }
                Ok(Event::Incoming(Incoming::PubAck(_))) if published => {
                    return Ok(());
                }
                Ok(_) => {}
                Err(ConnectionError::ConnectionRefused(code)) => {
                    return Err(describe_refusal(code).to_string());
                }
                Err(e) => return Err(format!("connection error: {}", e)),
            }
        }
    })
    .await;

    let _ = client.disconnect().await;

    match outcome {
        Ok(Ok(())) => CaseResult {
            name: scenario.name,
            passed: true,
            reason: "publish acknowledged".to_string(),
        },
        Ok(Err(reason)) => CaseResult {
            name: scenario.name,
            passed: false,
            reason,
        },
        Err(_) => CaseResult {
            name: scenario.name,
            passed: false,
            reason: "timed out waiting for broker".to_string(),
        },
    }
}

/// Human-readable explanation for a CONNACK refusal
fn describe_refusal(code: ConnectReturnCode) -> &'static str {
    match code {
        ConnectReturnCode::RefusedProtocolVersion => "unacceptable protocol version",
        ConnectReturnCode::BadClientId => "client identifier rejected",
        ConnectReturnCode::ServiceUnavailable => "service unavailable",
        ConnectReturnCode::BadUserNamePassword => "bad username or password",
        ConnectReturnCode::NotAuthorized => "not authorized",
        ConnectReturnCode::Success => "success",
    }
}

fn print_summary(results: &[CaseResult]) {
    println!();
    println!("============================================================");
    println!("📊 Summary");
    println!("============================================================");

    let passed = results.iter().filter(|r| r.passed).count();
    for result in results {
        let status = if result.passed { "✅" } else { "❌" };
        println!("{} {}: {}", status, result.name, result.reason);
    }

    println!();
    println!("   cases:        {}", results.len());
    println!("   passed:       {}", passed);
    println!("   failed:       {}", results.len() - passed);
    println!(
        "   success rate: {:.1}%",
        passed as f64 / results.len() as f64 * 100.0
    );

    println!();
    if passed == results.len() {
        println!("🎉 Every case connected and published.");
        println!("💡 The broker accepts all connections; authentication appears to be disabled.");
    } else {
        println!("⚠️  Some cases were rejected.");
        println!("💡 The broker enforces authentication for at least some credential shapes.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_matrix_is_complete() {
        let cases = scenarios();
        assert_eq!(cases.len(), 10);

        // names must be unique for the summary to be readable
        let mut names: Vec<_> = cases.iter().map(|c| c.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 10);
    }

    #[test]
    fn test_matrix_covers_anonymous_and_authenticated() {
        let cases = scenarios();
        assert!(cases.iter().any(|c| c.username.is_none()));
        assert!(cases.iter().any(|c| c.username.is_some() && c.password.is_some()));
        assert!(cases.iter().any(|c| c.client_id.is_some()));
    }

    #[test]
    fn test_describe_refusal_maps_auth_failures() {
        assert_eq!(
            describe_refusal(ConnectReturnCode::BadUserNamePassword),
            "bad username or password"
        );
        assert_eq!(
            describe_refusal(ConnectReturnCode::NotAuthorized),
            "not authorized"
        );
    }
}
