//! Modbus/TCP data source for the iDM Navigator.

use super::codec;
use crate::config::HeatpumpConfig;
use crate::error::{BridgeError, Result};
use crate::input::source::{DataSource, SensorValues};
use crate::sensors::{SensorAddress, SensorRegistry, SensorValue};
use async_trait::async_trait;
use log::{debug, info, warn};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_modbus::prelude::*;

/// Which register table an address is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterKind {
    Input,
    Holding,
}

impl RegisterKind {
    /// Writable addresses live in holding registers; everything else is read
    /// from input registers.
    pub fn for_address(address: &SensorAddress) -> Self {
        if address.is_writable() {
            RegisterKind::Holding
        } else {
            RegisterKind::Input
        }
    }
}

/// Data source talking Modbus/TCP to the heat pump.
///
/// One connection is shared by all requests. It is opened on first use and
/// dropped after any transport error, so the next request reconnects.
pub struct IdmModbusSource {
    hostname: String,
    port: u16,
    slave: Slave,
    timeout: Duration,
    registry: Arc<SensorRegistry>,
    context: Mutex<Option<client::Context>>,
}

impl IdmModbusSource {
    pub fn new(config: &HeatpumpConfig, registry: Arc<SensorRegistry>) -> Self {
        Self {
            hostname: config.hostname.clone(),
            port: config.port,
            slave: Slave(config.slave_id),
            timeout: Duration::from_secs(config.timeout_secs),
            registry,
            context: Mutex::new(None),
        }
    }

    async fn connect(&self) -> Result<client::Context> {
        let target = format!("{}:{}", self.hostname, self.port);
        let socket_addr = tokio::net::lookup_host(&target)
            .await?
            .next()
            .ok_or_else(|| BridgeError::DataSource(format!("cannot resolve {}", target)))?;

        info!("[Modbus] Connecting to {} ({})", target, socket_addr);
        let connect = tcp::connect_slave(socket_addr, self.slave);
        let context = tokio::time::timeout(self.timeout, connect)
            .await
            .map_err(|_| BridgeError::Timeout(format!("connect to {}", target)))??;
        Ok(context)
    }

    async fn connected<'a>(
        &self,
        slot: &'a mut Option<client::Context>,
    ) -> Result<&'a mut client::Context> {
        if slot.is_none() {
            *slot = Some(self.connect().await?);
        }
        slot.as_mut()
            .ok_or_else(|| BridgeError::DataSource("not connected".to_string()))
    }

    /// Run one Modbus request under the configured timeout.
    ///
    /// The outer error is a transport failure; the inner one is a Modbus
    /// exception reported by the controller.
    async fn request<T, F>(&self, what: &str, request: F) -> Result<std::result::Result<T, String>>
    where
        F: Future<Output = tokio_modbus::Result<T>>,
    {
        match tokio::time::timeout(self.timeout, request).await {
            Err(_) => Err(BridgeError::Timeout(what.to_string())),
            Ok(Err(e)) => Err(BridgeError::DataSource(format!("{}: {}", what, e))),
            Ok(Ok(result)) => Ok(result.map_err(|exception| format!("{:?}", exception))),
        }
    }

    async fn read_address(
        &self,
        context: &mut client::Context,
        address: &SensorAddress,
    ) -> Result<Option<Option<SensorValue>>> {
        let count = address.encoding.register_count();
        let what = format!("read {} @{}", address.name, address.register);
        let registers = match RegisterKind::for_address(address) {
            RegisterKind::Input => {
                self.request(&what, context.read_input_registers(address.register, count))
                    .await?
            }
            RegisterKind::Holding => {
                self.request(&what, context.read_holding_registers(address.register, count))
                    .await?
            }
        };

        match registers {
            Ok(registers) => Ok(Some(codec::decode(address, &registers)?)),
            Err(exception) => {
                debug!("[Modbus] {} not reported: {}", address.name, exception);
                Ok(None)
            }
        }
    }

    async fn fetch_with(&self, context: &mut client::Context) -> Result<SensorValues> {
        let mut values = SensorValues::new();
        for address in self.registry.readable() {
            if let Some(value) = self.read_address(context, address).await? {
                values.insert(address.name.clone(), value);
            }
        }
        Ok(values)
    }

    async fn write_with(
        &self,
        context: &mut client::Context,
        address: &SensorAddress,
        registers: &[u16],
    ) -> Result<std::result::Result<(), String>> {
        let what = format!("write {} @{}", address.name, address.register);
        match registers {
            [single] => {
                self.request(&what, context.write_single_register(address.register, *single))
                    .await
            }
            _ => {
                self.request(&what, context.write_multiple_registers(address.register, registers))
                    .await
            }
        }
    }
}

#[async_trait]
impl DataSource for IdmModbusSource {
    async fn fetch_all(&self) -> Result<SensorValues> {
        let mut slot = self.context.lock().await;
        let context = self.connected(&mut slot).await?;
        let result = self.fetch_with(context).await;
        match &result {
            Ok(values) => debug!("[Modbus] Fetched {} sensors", values.len()),
            Err(e) => {
                warn!("[Modbus] Fetch failed, dropping connection: {}", e);
                *slot = None;
            }
        }
        result
    }

    async fn write(&self, name: &str, value: SensorValue) -> Result<()> {
        let address = self.registry.resolve(name)?;
        let registers = codec::encode(address, value)?;

        let mut slot = self.context.lock().await;
        let context = self.connected(&mut slot).await?;
        match self.write_with(context, address, &registers).await {
            Ok(Ok(())) => {
                info!("[Modbus] Wrote {} = {} to register {}", name, value, address.register);
                Ok(())
            }
            Ok(Err(exception)) => {
                warn!("[Modbus] Controller rejected write to {}: {}", name, exception);
                Err(BridgeError::DataSource(format!(
                    "controller rejected write to {}: {}",
                    name, exception
                )))
            }
            Err(e) => {
                warn!("[Modbus] Write to {} failed, dropping connection: {}", name, e);
                *slot = None;
                Err(e)
            }
        }
    }
}
