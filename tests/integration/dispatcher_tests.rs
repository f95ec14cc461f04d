//! Dispatcher tests against the scripted native service: ordering,
//! exactly-once terminal delivery, contract violations and concurrent
//! callback delivery.

use std::cell::{Cell, RefCell};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use packbridge::diagnostics::{ContractViolation, set_violation_hook, violation_count};
use packbridge::dispatch::{Dispatcher, RESULT_OK};
use packbridge::{
    AssetPackBridge, BridgeConfig, DispatchMetrics, NativeError, NativePackState, Notification,
    NotificationSink, OperationKind, PackStatus, Phase, error_code,
};

use crate::mock_native::{NativeCall, RecordingSink, ScriptedManager};

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|n| (*n).to_owned()).collect()
}

fn uncoalesced() -> BridgeConfig {
    BridgeConfig {
        coalesce_progress: false,
        ..BridgeConfig::default()
    }
}

fn make_bridge(
    config: BridgeConfig,
) -> (AssetPackBridge<ScriptedManager>, Arc<ScriptedManager>, RecordingSink) {
    let native = Arc::new(ScriptedManager::new());
    let sink = RecordingSink::new();
    let bridge = AssetPackBridge::new(config, Arc::clone(&native), Box::new(sink.clone())).unwrap();
    (bridge, native, sink)
}

fn downloading(name: &str, done: i64) -> NativePackState {
    NativePackState::new(name, PackStatus::Downloading).with_bytes(done, 100)
}

fn completed(name: &str) -> NativePackState {
    NativePackState::new(name, PackStatus::Completed).with_bytes(100, 100)
}

// ── Ordering ──────────────────────────────────────────────────

#[test]
fn two_progress_events_then_completion_in_order() {
    let (bridge, native, sink) = make_bridge(uncoalesced());
    assert_eq!(native.calls(), [NativeCall::Subscribe]);

    let op = bridge.fetch(&names(&["packA"])).unwrap();
    native.emit(downloading("packA", 30));
    native.emit(downloading("packA", 60));
    native.emit(completed("packA"));

    let signals: Vec<_> = sink.for_op(op).iter().map(Notification::signal).collect();
    assert_eq!(
        signals,
        ["fetchStateUpdated", "fetchStateUpdated", "fetchSuccess"]
    );

    let progress: Vec<u64> = sink
        .for_op(op)
        .iter()
        .map(|n| match n {
            Notification::FetchStateUpdated { states, .. }
            | Notification::FetchSuccess { states, .. } => {
                states.get("packA").unwrap().bytes_downloaded
            }
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    assert_eq!(progress, [30, 60, 100]);
}

#[test]
fn coalesced_progress_still_ends_with_terminal() {
    let (bridge, native, sink) = make_bridge(BridgeConfig::default());
    let op = bridge.fetch(&names(&["packA"])).unwrap();
    native.emit(downloading("packA", 30));
    native.emit(downloading("packA", 30));
    native.emit(completed("packA"));

    let ops = sink.for_op(op);
    assert_eq!(ops.len(), 2);
    assert!(ops.last().unwrap().is_terminal());
    assert_eq!(bridge.metrics().coalesced, 1);
}

#[test]
fn global_update_precedes_operation_update() {
    let (bridge, native, sink) = make_bridge(BridgeConfig::default());
    bridge.fetch(&names(&["packA"])).unwrap();
    native.emit(downloading("packA", 1));
    assert_eq!(
        sink.signals(),
        ["assetPackStateUpdateSignal", "fetchStateUpdated"]
    );
}

#[test]
fn untracked_packs_only_reach_the_global_signal() {
    let (bridge, native, sink) = make_bridge(BridgeConfig::default());
    let op = bridge.fetch(&names(&["packA"])).unwrap();
    native.emit(downloading("packB", 1));
    assert!(sink.for_op(op).is_empty());
    assert_eq!(sink.signals(), ["assetPackStateUpdateSignal"]);
}

// ── Exactly-once terminal ─────────────────────────────────────

#[test]
fn nothing_follows_a_terminal_notification() {
    let (bridge, native, sink) = make_bridge(uncoalesced());
    let op = bridge.fetch(&names(&["packA", "packB"])).unwrap();
    native.emit(
        NativePackState::new("packA", PackStatus::Failed).with_error(error_code::INSUFFICIENT_STORAGE),
    );
    native.emit(completed("packB"));
    native.take_fetch()(Ok(vec![completed("packB")]));

    let ops = sink.for_op(op);
    assert_eq!(ops.len(), 1);
    match &ops[0] {
        Notification::FetchError {
            pack_name,
            error_code,
            ..
        } => {
            assert_eq!(pack_name.as_deref(), Some("packA"));
            assert_eq!(*error_code, error_code::INSUFFICIENT_STORAGE);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(bridge.metrics().live_operations, 0);
}

#[test]
fn fetch_rejected_by_service() {
    let (bridge, native, sink) = make_bridge(BridgeConfig::default());
    let op = bridge.fetch(&names(&["packA"])).unwrap();
    native.take_fetch()(Err(NativeError::new(error_code::API_NOT_AVAILABLE, "no api")));
    assert_eq!(
        sink.for_op(op),
        [Notification::FetchError {
            op,
            pack_name: None,
            error_code: error_code::API_NOT_AVAILABLE,
            message: "no api".into(),
        }]
    );
}

#[test]
fn single_shot_operations_complete_once() {
    let (bridge, native, sink) = make_bridge(BridgeConfig::default());
    let remove = bridge.remove_pack("packA").unwrap();
    let states = bridge.get_pack_states(&names(&["packA"])).unwrap();
    let confirm = bridge.show_cellular_data_confirmation().unwrap();

    native.take_confirmation()(Ok(RESULT_OK));
    native.take_state_query()(Err(NativeError::new(error_code::APP_UNAVAILABLE, "gone")));
    native.take_removal()(Err(NativeError::new(error_code::INTERNAL_ERROR, "io")));

    assert_eq!(
        sink.signals(),
        [
            "showCellularDataConfirmationSuccess",
            "getPackStatesError",
            "removePackError"
        ]
    );
    assert_eq!(sink.for_op(remove).len(), 1);
    assert_eq!(sink.for_op(states).len(), 1);
    assert_eq!(sink.for_op(confirm).len(), 1);
    assert_eq!(
        native.calls()[1..],
        [
            NativeCall::RemovePack("packA".into()),
            NativeCall::GetPackStates(names(&["packA"])),
            NativeCall::ShowCellularDataConfirmation,
        ]
    );
}

// ── Contract violations ───────────────────────────────────────

static UNDECODABLE: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    /// Dispatcher the hook inspects when a violation is raised on this thread.
    static WATCHED: RefCell<Option<Arc<Dispatcher>>> = const { RefCell::new(None) };
    static LIVE_SEEN_BY_HOOK: Cell<Option<usize>> = const { Cell::new(None) };
}

/// The one hook every test in this binary installs, so parallel tests
/// never swap it out from under each other.
fn test_hook(v: &ContractViolation) {
    if matches!(v, ContractViolation::UndecodablePayload { .. }) {
        UNDECODABLE.fetch_add(1, Ordering::SeqCst);
    }
    WATCHED.with(|w| {
        if let Some(dispatcher) = w.borrow().as_ref() {
            LIVE_SEEN_BY_HOOK.set(Some(dispatcher.metrics().live_operations));
        }
    });
}

#[test]
fn undecodable_listener_payload_goes_to_diagnostics() {
    let (bridge, native, sink) = make_bridge(BridgeConfig::default());
    bridge.fetch(&names(&["packA"])).unwrap();

    set_violation_hook(Some(test_hook));
    let before_hook = UNDECODABLE.load(Ordering::SeqCst);
    let before = violation_count();

    native.emit(NativePackState::new("packA", PackStatus::Downloading).with_bytes(-5, 100));

    assert!(violation_count() > before);
    assert!(UNDECODABLE.load(Ordering::SeqCst) > before_hook);
    assert!(sink.all().is_empty(), "violations never reach the sink");
}

#[test]
fn violation_hook_may_query_the_dispatcher() {
    let sink = RecordingSink::new();
    let dispatcher = Arc::new(Dispatcher::new(&BridgeConfig::default(), Box::new(sink.clone())));
    let op = dispatcher
        .begin(OperationKind::RemovePack, names(&["packA"]))
        .unwrap();

    set_violation_hook(Some(test_hook));
    WATCHED.with(|w| *w.borrow_mut() = Some(Arc::clone(&dispatcher)));
    LIVE_SEEN_BY_HOOK.set(None);

    // Wrong callback kind, then a duplicate completion.
    dispatcher.complete_cellular(op, Ok(RESULT_OK));
    assert_eq!(LIVE_SEEN_BY_HOOK.get(), Some(1));

    dispatcher.complete_remove(op, Ok(()));
    LIVE_SEEN_BY_HOOK.set(None);
    dispatcher.complete_remove(op, Ok(()));
    assert_eq!(LIVE_SEEN_BY_HOOK.get(), Some(0));

    WATCHED.with(|w| w.borrow_mut().take());
    assert_eq!(sink.signals(), ["removePackSuccess"]);
}

#[test]
fn stray_completions_are_violations_not_notifications() {
    let sink = RecordingSink::new();
    let dispatcher = Dispatcher::new(&BridgeConfig::default(), Box::new(sink.clone()));
    let op = dispatcher
        .begin(OperationKind::RemovePack, names(&["packA"]))
        .unwrap();

    let before = violation_count();
    dispatcher.complete_cellular(op, Ok(RESULT_OK));
    assert_eq!(dispatcher.phase(op), Some(Phase::Issued));

    dispatcher.complete_remove(op, Ok(()));
    dispatcher.complete_remove(op, Ok(()));
    dispatcher.complete_remove(packbridge::OperationId(op.0 + 100), Ok(()));

    assert!(violation_count() >= before + 3);
    assert_eq!(sink.signals(), ["removePackSuccess"]);
}

// ── Concurrency ───────────────────────────────────────────────

#[test]
fn callbacks_from_many_threads_keep_per_operation_order() {
    const OPS: usize = 8;
    const STEPS: i64 = 20;

    let (bridge, native, sink) = make_bridge(uncoalesced());
    let packs: Vec<String> = (0..OPS).map(|i| format!("pack{i}")).collect();
    let ops: Vec<_> = packs
        .iter()
        .map(|p| bridge.fetch(std::slice::from_ref(p)).unwrap())
        .collect();
    let acks: Vec<_> = (0..OPS).map(|_| native.take_fetch()).collect();

    let workers: Vec<_> = packs
        .iter()
        .cloned()
        .zip(acks)
        .map(|(pack, ack)| {
            let native = Arc::clone(&native);
            thread::spawn(move || {
                ack(Ok(vec![NativePackState::new(&pack, PackStatus::Pending)]));
                for step in 1..=STEPS {
                    native.emit(downloading(&pack, step));
                }
                native.emit(completed(&pack));
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }

    for op in ops {
        let seen = sink.for_op(op);
        // Acknowledgement, every progress step, completion.
        assert_eq!(seen.len(), STEPS as usize + 2, "{op}");
        assert_eq!(seen.iter().filter(|n| n.is_terminal()).count(), 1);
        assert!(seen.last().unwrap().is_terminal());

        let bytes: Vec<u64> = seen[1..=STEPS as usize]
            .iter()
            .map(|n| match n {
                Notification::FetchStateUpdated { states, .. } => {
                    states.iter().next().unwrap().bytes_downloaded
                }
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        let expected: Vec<u64> = (1..=STEPS as u64).collect();
        assert_eq!(bytes, expected);
    }
    assert_eq!(bridge.metrics().live_operations, 0);
}

/// Queries an unrelated dispatcher from another thread while emitting.
struct CrossBridgeSink {
    other: Arc<Dispatcher>,
    other_was_blocked: Arc<AtomicBool>,
    query: Arc<Mutex<Option<JoinHandle<DispatchMetrics>>>>,
}

impl NotificationSink for CrossBridgeSink {
    fn emit(&mut self, _: &Notification) {
        let (tx, rx) = mpsc::channel();
        let other = Arc::clone(&self.other);
        let handle = thread::spawn(move || {
            let metrics = other.metrics();
            let _ = tx.send(());
            metrics
        });
        let blocked = rx.recv_timeout(Duration::from_millis(50)).is_err();
        self.other_was_blocked.store(blocked, Ordering::SeqCst);
        *self.query.lock().unwrap() = Some(handle);
    }
}

#[test]
fn emitting_holds_the_lock_shared_by_every_dispatcher() {
    let other = Arc::new(Dispatcher::new(
        &BridgeConfig::default(),
        Box::new(RecordingSink::new()),
    ));
    let blocked = Arc::new(AtomicBool::new(false));
    let query = Arc::new(Mutex::new(None));
    let sink = CrossBridgeSink {
        other: Arc::clone(&other),
        other_was_blocked: Arc::clone(&blocked),
        query: Arc::clone(&query),
    };
    let dispatcher = Dispatcher::new(&BridgeConfig::default(), Box::new(sink));
    let op = dispatcher
        .begin(OperationKind::RemovePack, names(&["packA"]))
        .unwrap();

    dispatcher.complete_remove(op, Ok(()));

    assert!(blocked.load(Ordering::SeqCst));
    // Released once emit returns.
    let handle = query.lock().unwrap().take().unwrap();
    assert_eq!(handle.join().unwrap().live_operations, 0);
}
