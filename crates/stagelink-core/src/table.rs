//! Static device table
//!
//! Loaded once from configuration before the hub starts. Records are never
//! added or removed afterwards; the only mutable field is the per-record
//! `connected` flag, toggled by the hub's lifecycle handling.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, MacAddr, Result};

/// One known board
#[derive(Debug)]
pub struct DeviceRecord {
    pub identity: MacAddr,
    pub label: String,
    connected: AtomicBool,
}

impl DeviceRecord {
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }
}

/// Raw configuration entry for one board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceTableEntry {
    pub identity: String,
    pub label: String,
    #[serde(rename = "pinLayout")]
    pub pin_layout: Value,
}

/// The identity-keyed table of known boards, plus the label and pin-layout
/// indexes derived from it
#[derive(Debug, Default)]
pub struct DeviceTable {
    records: HashMap<MacAddr, DeviceRecord>,
    by_label: HashMap<String, MacAddr>,
    pin_layouts: HashMap<MacAddr, Value>,
}

impl DeviceTable {
    /// Build the table from configuration entries. Rejects malformed
    /// addresses and duplicate identities or labels.
    pub fn from_entries(entries: Vec<DeviceTableEntry>) -> Result<Self> {
        let mut table = Self::default();

        for entry in entries {
            let identity = MacAddr::parse(&entry.identity)?;

            if table.records.contains_key(&identity) {
                return Err(Error::InvalidTable(format!(
                    "duplicate identity: {}",
                    identity
                )));
            }
            if table.by_label.contains_key(&entry.label) {
                return Err(Error::InvalidTable(format!(
                    "duplicate label: {}",
                    entry.label
                )));
            }

            table.by_label.insert(entry.label.clone(), identity);
            table.pin_layouts.insert(identity, entry.pin_layout);
            table.records.insert(
                identity,
                DeviceRecord {
                    identity,
                    label: entry.label,
                    connected: AtomicBool::new(false),
                },
            );
        }

        Ok(table)
    }

    /// Parse the table from its JSON configuration form
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let entries: Vec<DeviceTableEntry> = serde_json::from_slice(data)?;
        Self::from_entries(entries)
    }

    pub fn get(&self, identity: MacAddr) -> Option<&DeviceRecord> {
        self.records.get(&identity)
    }

    pub fn contains(&self, identity: MacAddr) -> bool {
        self.records.contains_key(&identity)
    }

    /// Resolve a display label to its hardware address
    pub fn identity_of(&self, label: &str) -> Option<MacAddr> {
        self.by_label.get(label).copied()
    }

    pub fn pin_layout(&self, identity: MacAddr) -> Option<&Value> {
        self.pin_layouts.get(&identity)
    }

    /// Iterate all records (snapshot building on the supervisory side)
    pub fn records(&self) -> impl Iterator<Item = &DeviceRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
