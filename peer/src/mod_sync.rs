use std::{collections::HashSet, thread};

use log::{debug, info};
use smol::channel::{self, Receiver, TryRecvError};

use crate::error::MeadowPeerError;

/// A locally installed mod
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ModEntry {
    pub id: String,
    pub enabled: bool,
}

impl ModEntry {
    pub fn new<S: Into<String>>(id: S, enabled: bool) -> Self {
        Self {
            id: id.into(),
            enabled,
        }
    }
}

/// What has to change locally before joining a lobby that requires a set
/// of mods
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct ModListDiff {
    /// Installed but disabled mods the lobby requires
    pub to_enable: Vec<String>,
    /// Enabled mods the lobby does not run
    pub to_disable: Vec<String>,
    /// Required mods that are not installed at all
    pub unknown: Vec<String>,
}

impl ModListDiff {
    pub fn compute(installed: &[ModEntry], required: &[String]) -> Self {
        let required_ids: HashSet<&str> = required.iter().map(String::as_str).collect();
        let mut diff = Self::default();

        for id in required {
            match installed.iter().find(|entry| entry.id == *id) {
                Some(entry) if entry.enabled => {}
                Some(_) => diff.to_enable.push(id.clone()),
                None => diff.unknown.push(id.clone()),
            }
        }
        for entry in installed {
            if entry.enabled && !required_ids.contains(entry.id.as_str()) {
                diff.to_disable.push(entry.id.clone());
            }
        }

        diff.to_enable.sort();
        diff.to_disable.sort();
        diff.unknown.sort();
        diff
    }

    /// Whether the local mod set already matches
    pub fn is_empty(&self) -> bool {
        self.to_enable.is_empty() && self.to_disable.is_empty() && self.unknown.is_empty()
    }

    /// Whether the lobby can be joined after applying the diff
    pub fn is_satisfiable(&self) -> bool {
        self.unknown.is_empty()
    }
}

/// Compares the installed mods against a lobby's requirements on a worker
/// thread. The tick loop polls for the result.
pub struct ModListNegotiation {
    receiver: Receiver<ModListDiff>,
}

impl ModListNegotiation {
    pub fn start(installed: Vec<ModEntry>, required: Vec<String>) -> Result<Self, MeadowPeerError> {
        let (sender, receiver) = channel::bounded(1);
        thread::Builder::new()
            .name("meadow-mod-negotiation".to_string())
            .spawn(move || {
                let diff = ModListDiff::compute(&installed, &required);
                debug!("mod negotiation finished: {:?}", diff);
                if sender.try_send(diff).is_err() {
                    debug!("mod negotiation result dropped, session went away");
                }
            })
            .map_err(|error| MeadowPeerError::WorkerSpawn {
                reason: error.to_string(),
            })?;
        info!("started mod negotiation");
        Ok(Self { receiver })
    }

    /// `None` while the worker is still running
    pub fn poll(&mut self) -> Option<Result<ModListDiff, MeadowPeerError>> {
        match self.receiver.try_recv() {
            Ok(diff) => Some(Ok(diff)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(MeadowPeerError::WorkerLost)),
        }
    }
}
