//! History manager.
//!
//! Snapshots are keyed by an index owned by an external linear undo system
//! ([`HistoryPort`]). Pushing advances that index; when the undo system moves
//! the index on its own (undo/redo), the editor notices the mismatch and
//! copies the snapshot stored at the new index back into the live buffers.

use std::collections::BTreeMap;

use glam::{Vec3, Vec4};
use tracing::debug;

use crate::asset::MeshHandle;

/// The external undo index the history follows.
pub trait HistoryPort {
    fn current_index(&self) -> u64;

    /// Open a new undo step and return its index.
    fn advance(&mut self) -> u64;

    /// Called once a pushed step is complete.
    fn notify_changed(&mut self) {}
}

/// In-process linear undo index.
///
/// Starts at 0, which holds no snapshot; `undo` never goes below it.
#[derive(Debug, Default, Clone)]
pub struct LinearUndo {
    index: u64,
    head: u64,
    revision: u64,
}

impl LinearUndo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index < self.head
    }

    /// Step back. Returns false at the oldest index.
    pub fn undo(&mut self) -> bool {
        if !self.can_undo() {
            return false;
        }
        self.index -= 1;
        true
    }

    /// Step forward. Returns false at the newest index.
    pub fn redo(&mut self) -> bool {
        if !self.can_redo() {
            return false;
        }
        self.index += 1;
        true
    }

    /// Completed pushes so far
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

impl HistoryPort for LinearUndo {
    fn current_index(&self) -> u64 {
        self.index
    }

    fn advance(&mut self) -> u64 {
        self.index += 1;
        self.head = self.index;
        self.index
    }

    fn notify_changed(&mut self) {
        self.revision += 1;
    }
}

/// State of another mesh at snapshot time.
#[derive(Debug, Clone)]
pub struct MeshRecord {
    pub mesh: MeshHandle,
    pub normals: Option<Vec<Vec3>>,
    pub colors: Option<Vec<Vec4>>,
}

impl MeshRecord {
    pub fn normals(mesh: &MeshHandle, normals: Vec<Vec3>) -> Self {
        Self {
            mesh: mesh.clone(),
            normals: Some(normals),
            colors: None,
        }
    }

    pub fn colors(mesh: &MeshHandle, colors: Vec<Vec4>) -> Self {
        Self {
            mesh: mesh.clone(),
            normals: None,
            colors: Some(colors),
        }
    }

    /// Write the recorded data back onto the mesh and upload it.
    pub fn restore(&self) {
        let mut mesh = self.mesh.borrow_mut();
        if let Some(normals) = &self.normals {
            mesh.normals.clone_from(normals);
        }
        if let Some(colors) = &self.colors {
            mesh.colors.clone_from(colors);
        }
        mesh.upload();
    }
}

/// One undo step.
#[derive(Debug, Clone, Default)]
pub struct HistoryEntry {
    /// Posed normals of the edited mesh, if this step captured them
    pub normals: Option<Vec<Vec3>>,
    pub records: Vec<MeshRecord>,
}

pub struct HistoryManager<P: HistoryPort> {
    port: P,
    entries: BTreeMap<u64, HistoryEntry>,
    observed: u64,
}

impl<P: HistoryPort> HistoryManager<P> {
    pub fn new(port: P) -> Self {
        let observed = port.current_index();
        Self {
            port,
            entries: BTreeMap::new(),
            observed,
        }
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    /// Index of the last step this manager pushed or restored.
    pub fn observed_index(&self) -> u64 {
        self.observed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, index: u64) -> Option<&HistoryEntry> {
        self.entries.get(&index)
    }

    /// Record a new step. Steps above it (the redo tail) are discarded.
    pub fn push(&mut self, normals: Option<Vec<Vec3>>, records: Vec<MeshRecord>) -> u64 {
        let index = self.port.advance();
        let discarded = self.entries.split_off(&index).len();
        let entry = HistoryEntry { normals, records };
        debug!(
            "Pushed history step {} ({} normals, {} records, {} discarded)",
            index,
            entry.normals.as_ref().map_or(0, Vec::len),
            entry.records.len(),
            discarded
        );
        self.entries.insert(index, entry);
        self.observed = index;
        self.port.notify_changed();
        index
    }

    /// The new index when the external index moved since last observed.
    pub fn poll(&mut self) -> Option<u64> {
        let current = self.port.current_index();
        if current == self.observed {
            return None;
        }
        debug!("History index moved {} -> {}", self.observed, current);
        self.observed = current;
        Some(current)
    }
}
