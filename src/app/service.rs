//! Bridge facade: the hexagonal core.
//!
//! [`AssetPackBridge`] owns the dispatcher and the single listener
//! subscription on the native service. It validates arguments, issues
//! operation ids and forwards calls through the [`AssetPackManager`]
//! port. Asynchronous results come back as notifications on the sink.
//!
//! ```text
//!  host ──▶ ┌────────────────────────┐ ──▶ AssetPackManager
//!           │     AssetPackBridge     │
//!  sink ◀── │       Dispatcher        │ ◀── completions · listener
//!           └────────────────────────┘
//! ```

use std::sync::Arc;

use log::{debug, info};

use crate::codec::{DynamicMessage, MessageCodec};
use crate::config::{BridgeConfig, ConfigError};
use crate::diagnostics::{ContractViolation, report_violation};
use crate::dispatch::{DispatchMetrics, Dispatcher, OperationId, OperationKind};
use crate::error::{BridgeError, Result};
use crate::model::{PackState, PackStates};

use super::commands::{BridgeCommand, CommandReply};
use super::ports::{AssetPackManager, NotificationSink, Subscription};

// ───────────────────────────────────────────────────────────────
// AssetPackBridge
// ───────────────────────────────────────────────────────────────

pub struct AssetPackBridge<M: AssetPackManager + 'static> {
    config: BridgeConfig,
    manager: Arc<M>,
    dispatcher: Arc<Dispatcher>,
    subscription: Subscription,
}

impl<M: AssetPackManager + 'static> AssetPackBridge<M> {
    /// Validate `config`, then subscribe to `manager`'s state updates.
    pub fn new(
        config: BridgeConfig,
        manager: Arc<M>,
        sink: Box<dyn NotificationSink + Send>,
    ) -> core::result::Result<Self, ConfigError> {
        config.validate()?;
        let dispatcher = Arc::new(Dispatcher::new(&config, sink));
        let subscription = dispatcher.attach(manager.as_ref());
        info!("{} bridge attached", config.plugin_name);
        Ok(Self {
            config,
            manager,
            dispatcher,
            subscription,
        })
    }

    // ── Asynchronous operations ───────────────────────────────

    /// Start downloading `names`. Progress and the terminal outcome arrive
    /// as `fetch*` notifications tagged with the returned id.
    pub fn fetch(&self, names: &[String]) -> Result<OperationId> {
        validate_names(names)?;
        let op = self.dispatcher.begin(OperationKind::Fetch, names.to_vec())?;
        let dispatcher = Arc::clone(&self.dispatcher);
        self.manager
            .fetch(names, Box::new(move |result| dispatcher.complete_fetch(op, result)));
        Ok(op)
    }

    pub fn get_pack_states(&self, names: &[String]) -> Result<OperationId> {
        validate_names(names)?;
        let op = self
            .dispatcher
            .begin(OperationKind::GetPackStates, names.to_vec())?;
        let dispatcher = Arc::clone(&self.dispatcher);
        self.manager.get_pack_states(
            names,
            Box::new(move |result| dispatcher.complete_pack_states(op, result)),
        );
        Ok(op)
    }

    pub fn remove_pack(&self, name: &str) -> Result<OperationId> {
        validate_name(name)?;
        let op = self
            .dispatcher
            .begin(OperationKind::RemovePack, vec![name.to_owned()])?;
        let dispatcher = Arc::clone(&self.dispatcher);
        self.manager.remove_pack(
            name,
            Box::new(move |result| dispatcher.complete_remove(op, result)),
        );
        Ok(op)
    }

    pub fn show_cellular_data_confirmation(&self) -> Result<OperationId> {
        let op = self
            .dispatcher
            .begin(OperationKind::CellularConfirmation, Vec::new())?;
        let dispatcher = Arc::clone(&self.dispatcher);
        self.manager.show_cellular_data_confirmation(Box::new(move |result| {
            dispatcher.complete_cellular(op, result);
        }));
        Ok(op)
    }

    // ── Synchronous queries ───────────────────────────────────

    /// Cancel downloads and answer with the packs' current states, one
    /// entry per requested name. Names the service does not report come
    /// back as UNKNOWN.
    pub fn cancel(&self, names: &[String]) -> Result<DynamicMessage> {
        validate_names(names)?;
        let reported: PackStates = self
            .manager
            .cancel(names)
            .iter()
            .filter_map(|native| match PackState::try_from(native) {
                Ok(state) => Some(state),
                Err(error) => {
                    report_violation(&ContractViolation::UndecodablePayload {
                        context: "cancel result",
                        error,
                    });
                    None
                }
            })
            .collect();
        info!("cancel requested for {} packs", names.len());
        let states: PackStates = names.iter().map(|n| reported.state_or_unknown(n)).collect();
        Ok(states.encode())
    }

    /// Empty message when the pack or asset is not installed.
    pub fn get_asset_location(&self, pack: &str, asset_path: &str) -> Result<DynamicMessage> {
        validate_name(pack)?;
        if asset_path.is_empty() {
            return Err(BridgeError::InvalidArgument("asset path is empty"));
        }
        let location = self.manager.get_asset_location(pack, asset_path);
        debug!("getAssetLocation {pack}/{asset_path}: found={}", location.is_some());
        Ok(location.map_or_else(DynamicMessage::new, |loc| loc.encode()))
    }

    /// Empty message when the pack is not installed.
    pub fn get_pack_location(&self, pack: &str) -> Result<DynamicMessage> {
        validate_name(pack)?;
        Ok(self
            .manager
            .get_pack_location(pack)
            .map_or_else(DynamicMessage::new, |loc| loc.encode()))
    }

    /// Locations keyed by pack name, in request order. Packs that are not
    /// installed are omitted.
    pub fn get_pack_locations(&self, names: &[String]) -> Result<DynamicMessage> {
        validate_names(names)?;
        let installed = self.manager.get_pack_locations();
        Ok(names
            .iter()
            .filter_map(|name| {
                installed
                    .get(name)
                    .map(|loc| (name.clone(), loc.encode()))
            })
            .collect())
    }

    // ── Command routing ───────────────────────────────────────

    pub fn handle_command(&self, cmd: BridgeCommand) -> Result<CommandReply> {
        debug!("command {}", cmd.method());
        let reply = match cmd {
            BridgeCommand::Fetch { pack_names } => CommandReply::Started(self.fetch(&pack_names)?),
            BridgeCommand::Cancel { pack_names } => CommandReply::Message(self.cancel(&pack_names)?),
            BridgeCommand::GetAssetLocation {
                pack_name,
                asset_path,
            } => CommandReply::Message(self.get_asset_location(&pack_name, &asset_path)?),
            BridgeCommand::GetPackLocation { pack_name } => {
                CommandReply::Message(self.get_pack_location(&pack_name)?)
            }
            BridgeCommand::GetPackLocations { pack_names } => {
                CommandReply::Message(self.get_pack_locations(&pack_names)?)
            }
            BridgeCommand::GetPackStates { pack_names } => {
                CommandReply::Started(self.get_pack_states(&pack_names)?)
            }
            BridgeCommand::RemovePack { pack_name } => {
                CommandReply::Started(self.remove_pack(&pack_name)?)
            }
            BridgeCommand::ShowCellularDataConfirmation => {
                CommandReply::Started(self.show_cellular_data_confirmation()?)
            }
        };
        Ok(reply)
    }

    /// Parse and execute a host call by method name.
    pub fn call(&self, method: &str, args: &DynamicMessage) -> Result<DynamicMessage> {
        let cmd = BridgeCommand::parse(method, args)?;
        Ok(self.handle_command(cmd)?.into_message())
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn plugin_name(&self) -> &str {
        &self.config.plugin_name
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn metrics(&self) -> DispatchMetrics {
        self.dispatcher.metrics()
    }

    /// Whether the listener registration on the native service is live.
    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_active()
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(BridgeError::InvalidArgument("pack name is empty"));
    }
    Ok(())
}

fn validate_names(names: &[String]) -> Result<()> {
    if names.is_empty() {
        return Err(BridgeError::InvalidArgument("pack name list is empty"));
    }
    names.iter().try_for_each(|n| validate_name(n))
}
