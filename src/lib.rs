//! PackBridge library.
//!
//! Moves asset-pack data between a native delivery service and a host
//! that speaks dictionary-shaped [`DynamicMessage`]s, and turns the
//! service's asynchronous callbacks into ordered, operation-tagged
//! notifications.
//!
//! The core ([`app`], [`dispatch`], [`codec`]) is host-agnostic; concrete
//! port implementations live in [`adapters`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod codec;
pub mod config;
pub mod diagnostics;
pub mod dispatch;
pub mod model;

mod error;

pub use app::commands::{BridgeCommand, CommandReply, METHODS};
pub use app::events::{Notification, SIGNALS};
pub use app::ports::{
    AssetPackManager, Completion, NativePackState, NotificationSink, PackStateListener,
    Subscription,
};
pub use app::service::AssetPackBridge;
pub use codec::{Adapted, DynamicMessage, MessageCodec, Value};
pub use config::{BridgeConfig, ConfigError};
pub use dispatch::{DispatchMetrics, OperationId, OperationKind, Phase};
pub use error::{BridgeError, CodecError, NativeError, Result};
pub use model::{AssetLocation, PackLocation, PackState, PackStates, PackStatus, error_code};
