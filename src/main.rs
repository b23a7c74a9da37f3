use clap::Parser;
use idm_heatpump_bridge::bridge::Bridge;
use idm_heatpump_bridge::config::{self, Config};
use idm_heatpump_bridge::input::mqtt::MqttIntegration;
use idm_heatpump_bridge::input::simulation::run_simulation;
use idm_heatpump_bridge::instance_lock::InstanceLock;
use log::{error, info};
use std::process::ExitCode;
use std::time::Duration;
use tokio::signal;

#[derive(Parser)]
#[command(name = "idm-heatpump-bridge")]
#[command(about = "Expose an iDM heat pump as entities with risk-gated write services")]
struct Cli {
    /// Use an in-memory heat pump instead of Modbus/TCP
    #[arg(long, env = "IDM_SIMULATE")]
    simulate: bool,

    /// Seconds between refreshes (overrides IDM_POLL_INTERVAL_SECS)
    #[arg(long)]
    poll_interval: Option<u64>,

    /// Number of installed zone modules (overrides IDM_ZONES)
    #[arg(long)]
    zones: Option<u8>,

    /// Do not connect to the MQTT broker
    #[arg(long)]
    no_mqtt: bool,
}

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    config::load_dotenv();
    let cli = Cli::parse();
    init_logger();
    info!("Starting IDM Heat Pump Bridge");

    let mut config = Config::from_env();
    if let Some(interval) = cli.poll_interval {
        config.heatpump.poll_interval_secs = interval;
    }
    if let Some(zones) = cli.zones {
        config.heatpump.zones = zones;
    }
    if cli.no_mqtt {
        config.mqtt.enabled = false;
    }

    info!("Configuration loaded:");
    info!("  Heat pump: {}:{}", config.heatpump.hostname, config.heatpump.port);
    info!("  Entry ID: {}", config.heatpump.entry_id());
    info!("  Zones: {}", config.heatpump.zones);
    info!("  Poll interval: {}s", config.heatpump.poll_interval_secs);

    let _lock = match InstanceLock::acquire(&config.heatpump.hostname) {
        Ok(lock) => lock,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let bridge = match Bridge::build(config, cli.simulate) {
        Ok(bridge) => bridge,
        Err(e) => {
            error!("Failed to set up bridge: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let poll_interval = bridge.config.heatpump.poll_interval();
    let mut tasks = vec![bridge.coordinator.clone().start(poll_interval)];

    if let Some(sim) = &bridge.simulator {
        tasks.push(run_simulation(sim.clone(), Duration::from_secs(10)));
    }

    if bridge.config.mqtt.enabled {
        let integration = MqttIntegration::new(
            bridge.config.mqtt.clone(),
            bridge.config.topic_prefix(),
            bridge.coordinator.clone(),
            bridge.dispatcher.clone(),
            poll_interval,
        );
        tasks.push(integration.start());
    } else {
        info!("MQTT disabled");
    }

    info!("IDM Heat Pump Bridge is running");
    info!("  - {} entities", bridge.dispatcher.entities().len());
    info!("  - Press Ctrl+C to exit");

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Received shutdown signal");
        }
        Err(e) => {
            error!("Failed to listen for shutdown signal: {}", e);
        }
    }

    for task in tasks {
        task.abort();
    }

    info!("IDM Heat Pump Bridge stopped");
    ExitCode::SUCCESS
}
