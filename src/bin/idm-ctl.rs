//! Operator tool for an iDM heat pump.
//!
//! Lists the sensor registry, reads all current values, and calls the
//! risk-gated write services through the same dispatcher the bridge uses.
//! Writes take the per-heat-pump instance lock, so they are refused while a
//! bridge for the same heat pump is running.
//!
//! Usage:
//!   cargo run --bin idm-ctl -- sensors
//!   cargo run --bin idm-ctl -- read
//!   cargo run --bin idm-ctl -- set-temperature --target target_temp_water_heater \
//!       --value 50 --acknowledge-risk

use clap::{Args, Parser, Subcommand};
use idm_heatpump_bridge::bridge::Bridge;
use idm_heatpump_bridge::commands::{CommandRequest, WriteOperation};
use idm_heatpump_bridge::config::{self, Config};
use idm_heatpump_bridge::entity::Entity;
use idm_heatpump_bridge::instance_lock::{self, InstanceLock, InstanceLockError};
use idm_heatpump_bridge::sensors::Reading;
use serde_json::Value;
use std::path::Path;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "idm-ctl")]
#[command(about = "Inspect and control an iDM heat pump")]
struct Cli {
    /// Heat pump hostname or IP
    #[arg(long, env = "IDM_HOSTNAME")]
    host: Option<String>,

    /// Number of installed zone modules
    #[arg(long, env = "IDM_ZONES")]
    zones: Option<u8>,

    /// Use an in-memory heat pump instead of Modbus/TCP
    #[arg(long)]
    simulate: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every sensor in the registry
    Sensors,
    /// Refresh once and print every entity reading
    Read,
    /// Write a power value (kW) to a power sensor
    SetPower(WriteArgs),
    /// Write a battery charge state (%)
    SetBattery(WriteArgs),
    /// Write a temperature setpoint (°C)
    SetTemperature(WriteArgs),
    /// Write a humidity value (%)
    SetHumidity(WriteArgs),
}

#[derive(Args)]
struct WriteArgs {
    /// Sensor name or entity unique id
    #[arg(long)]
    target: String,

    /// Value as JSON number (integers for all but set-power)
    #[arg(long)]
    value: String,

    /// Confirm that writing to the heat pump is intended
    #[arg(long)]
    acknowledge_risk: bool,
}

impl WriteArgs {
    fn request(&self) -> Result<CommandRequest, Box<dyn std::error::Error>> {
        let value: Value = serde_json::from_str(&self.value)
            .map_err(|e| format!("value {:?} is not a JSON number: {}", self.value, e))?;
        Ok(CommandRequest::new(self.target.clone(), self.acknowledge_risk, value))
    }
}

/// Lock the heat pump for a write, unless the target is simulated.
fn write_lock(
    runtime_dir: &Path,
    hostname: &str,
    simulate: bool,
) -> Result<Option<InstanceLock>, InstanceLockError> {
    if simulate {
        return Ok(None);
    }
    InstanceLock::acquire_in(runtime_dir, hostname).map(Some)
}

fn print_reading(reading: Reading, display: Option<String>) -> String {
    match reading {
        Reading::Value(_) => display.unwrap_or_default(),
        Reading::Null => "-".to_string(),
        Reading::Unavailable => "unavailable".to_string(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    config::load_dotenv();
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let mut config = Config::from_env();
    if let Some(host) = cli.host {
        config.heatpump.hostname = host;
    }
    if let Some(zones) = cli.zones {
        config.heatpump.zones = zones;
    }

    let bridge = Bridge::build(config, cli.simulate)?;

    let (operation, args) = match &cli.command {
        Commands::Sensors => {
            for address in bridge.registry.all() {
                let write = address
                    .capabilities
                    .write
                    .map(|c| c.to_string())
                    .unwrap_or_default();
                let zone = address
                    .zone_id
                    .map(|z| format!("zone {}", u16::from(z) + 1))
                    .unwrap_or_default();
                println!(
                    "{:<40} {:>5} {:<8} {:<5} {:<12} {}",
                    address.name,
                    address.register,
                    address.value_type.kind(),
                    address.unit.unwrap_or(""),
                    write,
                    zone
                );
            }
            println!("{} sensors", bridge.registry.len());
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Read => {
            println!(
                "Reading {}:{}...",
                bridge.config.heatpump.hostname, bridge.config.heatpump.port
            );
            bridge.coordinator.refresh().await?;
            for entity in bridge.dispatcher.entities() {
                println!(
                    "{:<50} {}",
                    entity.identify(),
                    print_reading(entity.value(), entity.display_value())
                );
            }
            return Ok(ExitCode::SUCCESS);
        }
        Commands::SetPower(args) => (WriteOperation::SetPower, args),
        Commands::SetBattery(args) => (WriteOperation::SetBattery, args),
        Commands::SetTemperature(args) => (WriteOperation::SetTemperature, args),
        Commands::SetHumidity(args) => (WriteOperation::SetHumidity, args),
    };

    let request = args.request()?;
    let _lock = write_lock(
        &instance_lock::runtime_dir(),
        &bridge.config.heatpump.hostname,
        cli.simulate,
    )?;

    if let Err(e) = bridge.dispatcher.dispatch(operation, &request).await {
        eprintln!("{} failed [{}]: {}", operation, e.translation_key(), e);
        return Ok(ExitCode::FAILURE);
    }
    println!("{} {} = {}: ok", operation, args.target, args.value);

    Ok(ExitCode::SUCCESS)
}
