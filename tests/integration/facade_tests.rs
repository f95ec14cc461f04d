//! Facade tests: `AssetPackBridge` driven against the in-memory
//! simulated delivery service, observed through a `SignalQueue`.

use std::sync::Arc;

use packbridge::adapters::{Signal, SignalQueue, SimulatedAssetPackManager};
use packbridge::dispatch::RESULT_CANCELED;
use packbridge::{
    AssetPackBridge, BridgeConfig, BridgeError, CodecError, DynamicMessage, MessageCodec,
    PackStates, PackStatus, Value, error_code,
};

const CATALOG: &str = r#"{
    "base": {
        "location": { "assetsPath": "/data/base/assets", "packBaseOffset": 0, "packPath": "/data/base" },
        "assets": [
            { "offset": 0, "path": "levels/1.map", "size": 64 },
            { "offset": 64, "path": "levels/2.map", "size": 128 }
        ],
        "status": 4
    },
    "music": {
        "location": { "assetsPath": "/data/music/assets", "packBaseOffset": 512, "packPath": "/data/music" },
        "assets": [ { "offset": 512, "path": "theme.ogg", "size": 1024 } ]
    }
}"#;

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|n| (*n).to_owned()).collect()
}

fn make_bridge() -> (
    AssetPackBridge<SimulatedAssetPackManager>,
    Arc<SimulatedAssetPackManager>,
    SignalQueue,
) {
    let sim = Arc::new(SimulatedAssetPackManager::from_catalog_json(CATALOG).unwrap());
    let queue = SignalQueue::new();
    let bridge = AssetPackBridge::new(
        BridgeConfig::default(),
        Arc::clone(&sim),
        Box::new(queue.clone()),
    )
    .unwrap();
    (bridge, sim, queue)
}

fn signal_names(signals: &[Signal]) -> Vec<&'static str> {
    signals.iter().map(|s| s.name).collect()
}

fn pack_states(signal: &Signal) -> PackStates {
    let msg = signal.args.get("packStates").and_then(Value::as_message).unwrap();
    PackStates::decode(msg).unwrap()
}

// ── Fetch lifecycle ───────────────────────────────────────────

#[test]
fn fetch_reports_progress_then_success_last() {
    let (bridge, sim, queue) = make_bridge();
    let op = bridge.fetch(&names(&["music"])).unwrap();
    assert!(queue.is_empty(), "nothing before the service answers");

    sim.run_pending();
    sim.advance("music", 256);
    sim.advance("music", 768);
    sim.complete("music");

    let signals = queue.drain();
    assert_eq!(
        signal_names(&signals),
        [
            "fetchStateUpdated",
            "assetPackStateUpdateSignal",
            "fetchStateUpdated",
            "assetPackStateUpdateSignal",
            "fetchStateUpdated",
            "assetPackStateUpdateSignal",
            "fetchSuccess",
        ]
    );
    let last = signals.last().unwrap();
    assert_eq!(last.args.get("operationId"), Some(&Value::Int(op.0 as i64)));
    let music = pack_states(last).get("music").cloned().unwrap();
    assert_eq!(music.status, PackStatus::Completed);
    assert_eq!(music.bytes_downloaded, 1024);

    // Installed now.
    assert!(!bridge.get_pack_location("music").unwrap().is_empty());
    assert_eq!(bridge.metrics().live_operations, 0);
}

#[test]
fn fetch_of_installed_pack_succeeds_on_acknowledgement() {
    let (bridge, sim, queue) = make_bridge();
    bridge.fetch(&names(&["base"])).unwrap();
    sim.run_pending();
    assert_eq!(signal_names(&queue.drain()), ["fetchSuccess"]);
}

#[test]
fn fetch_of_unavailable_pack_fails_without_pack_name() {
    let (bridge, sim, queue) = make_bridge();
    bridge.fetch(&names(&["music", "ghost"])).unwrap();
    sim.run_pending();

    let signals = queue.drain();
    assert_eq!(signal_names(&signals), ["fetchError"]);
    let args = &signals[0].args;
    assert!(!args.contains_key("packName"));
    assert_eq!(
        args.get("errorCode"),
        Some(&Value::Int(i64::from(error_code::PACK_UNAVAILABLE)))
    );
}

#[test]
fn failed_download_names_the_pack() {
    let (bridge, sim, queue) = make_bridge();
    bridge.fetch(&names(&["music"])).unwrap();
    sim.run_pending();
    sim.fail("music", error_code::NETWORK_ERROR);

    let signals = queue.drain();
    let last = signals.last().unwrap();
    assert_eq!(last.name, "fetchError");
    assert_eq!(last.args.get("packName").and_then(Value::as_str), Some("music"));
    assert_eq!(
        last.args.get("errorCode"),
        Some(&Value::Int(i64::from(error_code::NETWORK_ERROR)))
    );
}

// ── Cancel ────────────────────────────────────────────────────

#[test]
fn cancel_answers_every_requested_name() {
    let (bridge, sim, queue) = make_bridge();
    let op = bridge.fetch(&names(&["music"])).unwrap();
    sim.run_pending();
    sim.advance("music", 10);
    queue.drain();

    let reply = bridge.cancel(&names(&["music", "ghost"])).unwrap();
    let states = PackStates::decode(&reply).unwrap();
    assert_eq!(states.names().collect::<Vec<_>>(), ["music", "ghost"]);
    assert_eq!(states.get("music").unwrap().status, PackStatus::Canceled);
    assert_eq!(states.get("ghost").unwrap().status, PackStatus::Unknown);
    assert_eq!(states.get("ghost").unwrap().bytes_downloaded, 0);

    // The running fetch settles as canceled through the listener.
    let signals = queue.drain();
    let last = signals.last().unwrap();
    assert_eq!(last.name, "fetchSuccess");
    assert_eq!(last.args.get("operationId"), Some(&Value::Int(op.0 as i64)));
    assert_eq!(
        pack_states(last).get("music").unwrap().status,
        PackStatus::Canceled
    );
}

// ── Locations ─────────────────────────────────────────────────

#[test]
fn get_pack_locations_omits_unknown_names() {
    let (bridge, _, _) = make_bridge();
    let reply = bridge.get_pack_locations(&names(&["base", "packB"])).unwrap();
    assert_eq!(reply.keys().collect::<Vec<_>>(), ["base"]);
    let base = reply.get("base").and_then(Value::as_message).unwrap();
    assert_eq!(
        base.get("packPath").and_then(Value::as_str),
        Some("/data/base")
    );
}

#[test]
fn absent_locations_are_empty_messages() {
    let (bridge, _, _) = make_bridge();
    assert_eq!(bridge.get_pack_location("music").unwrap(), DynamicMessage::new());
    assert_eq!(
        bridge.get_asset_location("base", "levels/9.map").unwrap(),
        DynamicMessage::new()
    );
    assert_eq!(
        bridge.get_asset_location("ghost", "levels/1.map").unwrap(),
        DynamicMessage::new()
    );
}

#[test]
fn asset_location_is_encoded() {
    let (bridge, _, _) = make_bridge();
    let msg = bridge.get_asset_location("base", "levels/2.map").unwrap();
    assert_eq!(
        msg,
        DynamicMessage::new()
            .with("offset", 64)
            .with("path", "levels/2.map")
            .with("size", 128)
    );
}

// ── Remove / states / confirmation ────────────────────────────

#[test]
fn remove_pack_uninstalls() {
    let (bridge, sim, queue) = make_bridge();
    let op = bridge.remove_pack("base").unwrap();
    sim.run_pending();

    let signals = queue.drain();
    assert_eq!(signal_names(&signals), ["removePackSuccess"]);
    assert_eq!(
        signals[0].args.get("operationId"),
        Some(&Value::Int(op.0 as i64))
    );
    assert_eq!(
        signals[0].args.get("status"),
        Some(&Value::Int(i64::from(PackStatus::NotInstalled.code())))
    );
    assert!(bridge.get_pack_location("base").unwrap().is_empty());
}

#[test]
fn remove_unknown_pack_reports_native_error() {
    let (bridge, sim, queue) = make_bridge();
    bridge.remove_pack("ghost").unwrap();
    sim.run_pending();

    let signals = queue.drain();
    assert_eq!(signal_names(&signals), ["removePackError"]);
    assert_eq!(
        signals[0].args.get("packName").and_then(Value::as_str),
        Some("ghost")
    );
}

#[test]
fn get_pack_states_fills_unknown_names() {
    let (bridge, sim, queue) = make_bridge();
    bridge.get_pack_states(&names(&["base", "ghost"])).unwrap();
    sim.run_pending();

    let signals = queue.drain();
    assert_eq!(signal_names(&signals), ["getPackStatesSuccess"]);
    let states = pack_states(&signals[0]);
    assert_eq!(states.get("base").unwrap().status, PackStatus::Completed);
    assert_eq!(states.get("ghost").unwrap().status, PackStatus::Unknown);
}

#[test]
fn denied_cellular_confirmation_is_still_a_success_signal() {
    let (bridge, sim, queue) = make_bridge();
    sim.set_cellular_answer(RESULT_CANCELED);
    bridge.show_cellular_data_confirmation().unwrap();
    sim.run_pending();

    let signals = queue.drain();
    assert_eq!(signal_names(&signals), ["showCellularDataConfirmationSuccess"]);
    assert_eq!(signals[0].args.get("resultCode"), Some(&Value::Int(0)));
}

// ── Command routing and validation ────────────────────────────

#[test]
fn call_by_method_name() {
    let (bridge, sim, queue) = make_bridge();
    let args = DynamicMessage::new().with(
        "packNames",
        vec![DynamicMessage::new().with("name", "base")],
    );
    let reply = bridge.call("fetch", &args).unwrap();
    assert!(reply.contains_key("operationId"));
    sim.run_pending();
    assert_eq!(signal_names(&queue.drain()), ["fetchSuccess"]);

    let reply = bridge
        .call("getPackLocation", &DynamicMessage::new().with("packName", "base"))
        .unwrap();
    assert!(reply.contains_key("assetsPath"));
}

#[test]
fn malformed_calls_fail_synchronously() {
    let (bridge, sim, queue) = make_bridge();
    assert_eq!(
        bridge.fetch(&[]),
        Err(BridgeError::InvalidArgument("pack name list is empty"))
    );
    assert_eq!(
        bridge.call("getPackLocation", &DynamicMessage::new()),
        Err(BridgeError::Codec(CodecError::MissingField("packName")))
    );
    assert_eq!(
        bridge.get_asset_location("base", ""),
        Err(BridgeError::InvalidArgument("asset path is empty"))
    );
    assert_eq!(sim.pending_calls(), 0);
    assert!(queue.is_empty());
}

#[test]
fn live_operation_limit_is_enforced() {
    let sim = Arc::new(SimulatedAssetPackManager::from_catalog_json(CATALOG).unwrap());
    let config = BridgeConfig {
        max_live_operations: 1,
        ..BridgeConfig::default()
    };
    let bridge = AssetPackBridge::new(config, Arc::clone(&sim), Box::new(SignalQueue::new())).unwrap();
    bridge.remove_pack("base").unwrap();
    assert_eq!(
        bridge.get_pack_states(&names(&["base"])),
        Err(BridgeError::TooManyOperations { limit: 1 })
    );
    sim.run_pending();
    assert!(bridge.get_pack_states(&names(&["base"])).is_ok());
}

#[test]
fn dropping_the_bridge_unsubscribes() {
    let (bridge, sim, _) = make_bridge();
    assert!(bridge.is_subscribed());
    assert_eq!(sim.listener_count(), 1);
    drop(bridge);
    assert_eq!(sim.listener_count(), 0);
}

#[test]
fn invalid_config_is_rejected() {
    let sim = Arc::new(SimulatedAssetPackManager::from_catalog_json(CATALOG).unwrap());
    let config = BridgeConfig {
        plugin_name: String::new(),
        ..BridgeConfig::default()
    };
    assert!(AssetPackBridge::new(config, sim, Box::new(SignalQueue::new())).is_err());
}
