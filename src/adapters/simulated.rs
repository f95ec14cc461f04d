//! In-memory native delivery service.
//!
//! Implements [`AssetPackManager`] over a catalog of packs held in memory.
//! Asynchronous calls are queued and only complete when the host calls
//! [`run_pending`](SimulatedAssetPackManager::run_pending); download
//! progress is driven explicitly with `advance` / `complete` / `fail`.
//! Completions and listener callbacks always run outside the internal
//! lock, so they may call back into the manager.
//!
//! Catalog shape (one entry per pack, keyed by pack name):
//!
//! ```text
//! {
//!   "packA": {
//!     "location": { "assetsPath": .., "packBaseOffset": .., "packPath": .. },
//!     "assets":   [ { "offset": .., "path": .., "size": .. }, .. ],
//!     "status":   4                      // optional, default NOT_INSTALLED
//!   }
//! }
//! ```

use core::cell::RefCell;
use std::collections::VecDeque;
use std::sync::Arc;

use anyhow::Context;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use indexmap::IndexMap;
use log::{debug, info};

use crate::app::ports::{
    AssetPackManager, Completion, NativePackState, PackStateListener, Subscription,
};
use crate::codec::fields::{read_i64, read_message, read_message_at, read_sequence, require_keys};
use crate::codec::{Adapted, DynamicMessage};
use crate::dispatch::RESULT_OK;
use crate::error::{CodecError, NativeError};
use crate::model::{AssetLocation, PackLocation, PackStatus, error_code};

const LOCATION: &str = "location";
const ASSETS: &str = "assets";
const STATUS: &str = "status";

struct CatalogPack {
    location: PackLocation,
    assets: Vec<AssetLocation>,
    state: NativePackState,
}

impl CatalogPack {
    fn installed(&self) -> bool {
        self.state.status == PackStatus::Completed.code()
    }

    fn total_bytes(&self) -> i64 {
        let sum: u64 = self.assets.iter().map(AssetLocation::size).sum();
        i64::try_from(sum).unwrap_or(i64::MAX)
    }
}

enum PendingCall {
    Fetch {
        names: Vec<String>,
        done: Completion<Vec<NativePackState>>,
    },
    RemovePack {
        name: String,
        done: Completion<()>,
    },
    GetPackStates {
        names: Vec<String>,
        done: Completion<Vec<NativePackState>>,
    },
    CellularConfirmation {
        done: Completion<i32>,
    },
}

struct State {
    packs: IndexMap<String, CatalogPack>,
    listeners: Vec<(u64, Arc<dyn PackStateListener>)>,
    next_listener: u64,
    pending: VecDeque<PendingCall>,
    cellular_answer: i32,
}

type Shared = Arc<Mutex<CriticalSectionRawMutex, RefCell<State>>>;

pub struct SimulatedAssetPackManager {
    shared: Shared,
}

impl SimulatedAssetPackManager {
    /// Build from a catalog message. Every location and asset entry is
    /// validated through its codec before the pack is accepted.
    pub fn from_catalog(catalog: &DynamicMessage) -> Result<Self, CodecError> {
        let mut packs = IndexMap::new();
        for (name, value) in catalog.iter() {
            let entry = read_message_at(name, value)?;
            require_keys(entry, &[LOCATION, ASSETS])?;

            let location = Adapted::<PackLocation>::new(read_message(entry, LOCATION)?.clone())?;
            for extra in location.extra_keys() {
                debug!("catalog {name}: ignoring location key {extra}");
            }

            let assets = read_sequence(entry, ASSETS)?
                .iter()
                .map(|m| Adapted::<AssetLocation>::new(m.clone()).map(Adapted::into_inner))
                .collect::<Result<Vec<_>, _>>()?;

            let status = if entry.contains_key(STATUS) {
                PackStatus::from_code(read_i64(entry, STATUS)?).ok_or(CodecError::OutOfRange {
                    key: STATUS.into(),
                })?
            } else {
                PackStatus::NotInstalled
            };

            let mut pack = CatalogPack {
                location: location.into_inner(),
                assets,
                state: NativePackState::new(name, status),
            };
            if status == PackStatus::Completed {
                let total = pack.total_bytes();
                pack.state = pack.state.with_bytes(total, total);
            }
            packs.insert(name.to_owned(), pack);
        }
        info!("simulated delivery service: {} packs", packs.len());
        Ok(Self {
            shared: Arc::new(Mutex::new(RefCell::new(State {
                packs,
                listeners: Vec::new(),
                next_listener: 1,
                pending: VecDeque::new(),
                cellular_answer: RESULT_OK,
            }))),
        })
    }

    /// Parse a JSON catalog document.
    pub fn from_catalog_json(text: &str) -> anyhow::Result<Self> {
        let catalog = DynamicMessage::from_json(text).context("catalog is not valid JSON")?;
        Self::from_catalog(&catalog).context("catalog entry rejected")
    }

    fn with<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        self.shared.lock(|cell| f(&mut cell.borrow_mut()))
    }

    // ── Driving the simulation ────────────────────────────────

    /// Result code the next cellular confirmations complete with.
    pub fn set_cellular_answer(&self, result_code: i32) {
        self.with(|s| s.cellular_answer = result_code);
    }

    /// Asynchronous calls not yet completed.
    pub fn pending_calls(&self) -> usize {
        self.with(|s| s.pending.len())
    }

    /// Complete every queued call in arrival order. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Some(call) = self.with(|s| s.pending.pop_front()) {
            self.run(call);
            ran += 1;
        }
        ran
    }

    fn run(&self, call: PendingCall) {
        match call {
            PendingCall::Fetch { names, done } => {
                let result = self.with(|s| {
                    if let Some(missing) = names.iter().find(|n| !s.packs.contains_key(*n)) {
                        return Err(NativeError::new(
                            error_code::PACK_UNAVAILABLE,
                            format!("pack {missing} is not available"),
                        ));
                    }
                    let mut states = Vec::with_capacity(names.len());
                    for name in &names {
                        if let Some(pack) = s.packs.get_mut(name) {
                            if !pack.installed() {
                                let total = pack.total_bytes();
                                pack.state = NativePackState::new(name, PackStatus::Pending)
                                    .with_bytes(0, total);
                            }
                            states.push(pack.state.clone());
                        }
                    }
                    Ok(states)
                });
                done(result);
            }
            PendingCall::RemovePack { name, done } => {
                let result = self.with(|s| match s.packs.get_mut(&name) {
                    Some(pack) => {
                        pack.state = NativePackState::new(&name, PackStatus::NotInstalled);
                        Ok(())
                    }
                    None => Err(NativeError::new(
                        error_code::PACK_UNAVAILABLE,
                        format!("pack {name} is not available"),
                    )),
                });
                done(result);
            }
            PendingCall::GetPackStates { names, done } => {
                let states = self.with(|s| {
                    names
                        .iter()
                        .filter_map(|n| s.packs.get(n).map(|p| p.state.clone()))
                        .collect()
                });
                done(Ok(states));
            }
            PendingCall::CellularConfirmation { done } => {
                let answer = self.with(|s| s.cellular_answer);
                done(Ok(answer));
            }
        }
    }

    /// Move a pack to DOWNLOADING with `bytes` received.
    pub fn advance(&self, name: &str, bytes: i64) -> bool {
        self.transition(name, |pack| {
            let total = pack.total_bytes();
            NativePackState::new(name, PackStatus::Downloading).with_bytes(bytes.min(total), total)
        })
    }

    /// Finish a pack's download.
    pub fn complete(&self, name: &str) -> bool {
        self.transition(name, |pack| {
            let total = pack.total_bytes();
            NativePackState::new(name, PackStatus::Completed).with_bytes(total, total)
        })
    }

    /// Fail a pack's download with a native error code.
    pub fn fail(&self, name: &str, code: i32) -> bool {
        self.transition(name, |pack| {
            NativePackState::new(name, PackStatus::Failed)
                .with_bytes(pack.state.bytes_downloaded, pack.total_bytes())
                .with_error(code)
        })
    }

    /// Deliver `state` to listeners verbatim, bypassing the catalog.
    pub fn inject(&self, state: NativePackState) {
        let listeners = self.with(|s| listeners_of(s));
        notify(&listeners, &state);
    }

    /// Current state of a catalog pack.
    pub fn state(&self, name: &str) -> Option<NativePackState> {
        self.with(|s| s.packs.get(name).map(|p| p.state.clone()))
    }

    pub fn listener_count(&self) -> usize {
        self.with(|s| s.listeners.len())
    }

    fn transition(&self, name: &str, next: impl FnOnce(&CatalogPack) -> NativePackState) -> bool {
        let update = self.with(|s| {
            let pack = s.packs.get_mut(name)?;
            pack.state = next(pack);
            let state = pack.state.clone();
            Some((state, listeners_of(s)))
        });
        match update {
            Some((state, listeners)) => {
                notify(&listeners, &state);
                true
            }
            None => false,
        }
    }
}

fn listeners_of(s: &State) -> Vec<Arc<dyn PackStateListener>> {
    s.listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
}

fn notify(listeners: &[Arc<dyn PackStateListener>], state: &NativePackState) {
    for listener in listeners {
        listener.on_state_update(state.clone());
    }
}

fn is_active(status: i32) -> bool {
    [
        PackStatus::Pending,
        PackStatus::Downloading,
        PackStatus::Transferring,
        PackStatus::WaitingForWifi,
        PackStatus::RequiresUserConfirmation,
    ]
    .iter()
    .any(|s| s.code() == status)
}

impl AssetPackManager for SimulatedAssetPackManager {
    fn fetch(&self, names: &[String], done: Completion<Vec<NativePackState>>) {
        self.with(|s| {
            s.pending.push_back(PendingCall::Fetch {
                names: names.to_vec(),
                done,
            });
        });
    }

    fn cancel(&self, names: &[String]) -> Vec<NativePackState> {
        let (states, canceled, listeners) = self.with(|s| {
            let mut states = Vec::new();
            let mut canceled = Vec::new();
            for name in names {
                if let Some(pack) = s.packs.get_mut(name) {
                    if is_active(pack.state.status) {
                        pack.state.status = PackStatus::Canceled.code();
                        canceled.push(pack.state.clone());
                    }
                    states.push(pack.state.clone());
                }
            }
            (states, canceled, listeners_of(s))
        });
        for state in &canceled {
            notify(&listeners, state);
        }
        states
    }

    fn remove_pack(&self, name: &str, done: Completion<()>) {
        self.with(|s| {
            s.pending.push_back(PendingCall::RemovePack {
                name: name.to_owned(),
                done,
            });
        });
    }

    fn get_pack_states(&self, names: &[String], done: Completion<Vec<NativePackState>>) {
        self.with(|s| {
            s.pending.push_back(PendingCall::GetPackStates {
                names: names.to_vec(),
                done,
            });
        });
    }

    fn get_asset_location(&self, pack: &str, asset_path: &str) -> Option<AssetLocation> {
        self.with(|s| {
            s.packs
                .get(pack)
                .filter(|p| p.installed())?
                .assets
                .iter()
                .find(|a| a.path() == asset_path)
                .cloned()
        })
    }

    fn get_pack_location(&self, pack: &str) -> Option<PackLocation> {
        self.with(|s| {
            s.packs
                .get(pack)
                .filter(|p| p.installed())
                .map(|p| p.location.clone())
        })
    }

    fn get_pack_locations(&self) -> IndexMap<String, PackLocation> {
        self.with(|s| {
            s.packs
                .iter()
                .filter(|(_, p)| p.installed())
                .map(|(n, p)| (n.clone(), p.location.clone()))
                .collect()
        })
    }

    fn show_cellular_data_confirmation(&self, done: Completion<i32>) {
        self.with(|s| s.pending.push_back(PendingCall::CellularConfirmation { done }));
    }

    fn subscribe(&self, listener: Arc<dyn PackStateListener>) -> Subscription {
        let id = self.with(|s| {
            let id = s.next_listener;
            s.next_listener += 1;
            s.listeners.push((id, listener));
            id
        });
        let shared = Arc::clone(&self.shared);
        Subscription::new(move || {
            shared.lock(|cell| cell.borrow_mut().listeners.retain(|(i, _)| *i != id));
        })
    }
}
