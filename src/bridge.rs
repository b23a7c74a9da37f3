//! Wiring of one configured heat pump.
//!
//! Builds the registry, data source, coordinator, entities and dispatcher
//! from configuration, shared by the daemon and the operator CLI.

use crate::commands::CommandDispatcher;
use crate::config::Config;
use crate::coordinator::UpdateCoordinator;
use crate::device::EntryContext;
use crate::entity::build_entities;
use crate::error::Result;
use crate::input::{DataSource, IdmModbusSource, SimulatedHeatpump};
use crate::sensors::SensorRegistry;
use log::info;
use std::sync::Arc;

pub struct Bridge {
    pub config: Config,
    pub registry: Arc<SensorRegistry>,
    pub context: Arc<EntryContext>,
    pub coordinator: Arc<UpdateCoordinator>,
    pub dispatcher: Arc<CommandDispatcher>,
    /// Set when running against the simulator instead of a real heat pump.
    pub simulator: Option<Arc<SimulatedHeatpump>>,
}

impl Bridge {
    pub fn build(config: Config, simulate: bool) -> Result<Self> {
        config.validate()?;

        let registry = Arc::new(SensorRegistry::heatpump(config.heatpump.zones)?);
        info!(
            "Registry has {} sensors for {} zone(s)",
            registry.len(),
            config.heatpump.zones
        );

        let (source, simulator): (Arc<dyn DataSource>, _) = if simulate {
            info!("Using simulated heat pump");
            let sim = Arc::new(SimulatedHeatpump::new(&registry));
            (sim.clone(), Some(sim))
        } else {
            info!(
                "Using Modbus/TCP heat pump at {}:{}",
                config.heatpump.hostname, config.heatpump.port
            );
            (
                Arc::new(IdmModbusSource::new(&config.heatpump, registry.clone())),
                None,
            )
        };

        let context = Arc::new(EntryContext::new(
            config.heatpump.entry_id(),
            config.heatpump.hostname.clone(),
            config.heatpump.display_name.clone(),
        ));
        let coordinator = Arc::new(UpdateCoordinator::new(source));
        let dispatcher = Arc::new(CommandDispatcher::new(build_entities(
            &registry,
            &coordinator,
            &context,
        )));

        Ok(Self {
            config,
            registry,
            context,
            coordinator,
            dispatcher,
            simulator,
        })
    }
}
