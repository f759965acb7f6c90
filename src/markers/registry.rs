//! MarkerRegistry - owner of all markers created on a tracker.
//!
//! Markers are kept in creation order so ordinal lookups (`get(index)`) stay
//! dense after a destroy: later markers shift down by one. Handles are never
//! reused.
//!
//! The registry itself is not synchronized; `MarkerTracker` keeps it behind
//! the cycle lock.

use tracing::debug;

use crate::error::{Result, TrackerError};
use crate::geometry::MarkerSize;

use super::marker::Marker;
use super::types::MarkerHandle;

/// Set of live markers for one tracker.
#[derive(Debug)]
pub struct MarkerRegistry {
    /// Live markers in creation order.
    markers: Vec<Marker>,

    /// Counter for generating unique handles.
    next_handle: u64,

    /// Maximum number of live markers.
    capacity: usize,

    /// Bumped on every structural or size change.
    revision: u64,
}

impl MarkerRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            markers: Vec::new(),
            next_handle: 0,
            capacity,
            revision: 0,
        }
    }

    /// Register a new marker.
    ///
    /// Rejects a pattern id that is already live, a size that is not finite
    /// and positive, and any create beyond the configured capacity. On
    /// failure the registry is left untouched.
    pub fn create(&mut self, id: i32, name: &str, size: MarkerSize) -> Result<MarkerHandle> {
        if !size.is_valid() {
            return Err(TrackerError::InvalidMarkerSize(size));
        }
        if self.find_by_id(id).is_some() {
            return Err(TrackerError::DuplicateMarkerId(id));
        }
        if self.markers.len() >= self.capacity {
            return Err(TrackerError::MarkerCapacity(self.capacity));
        }

        let handle = MarkerHandle::new(self.next_handle);
        self.next_handle += 1;
        self.markers.push(Marker::new(handle, id, name, size));
        self.revision += 1;

        debug!("Created marker {} '{}' (id {}, {})", handle, name, id, size);
        Ok(handle)
    }

    /// Remove a marker, returning it. `None` if the handle is not live.
    pub fn destroy(&mut self, handle: MarkerHandle) -> Option<Marker> {
        let idx = self.markers.iter().position(|m| m.handle == handle)?;
        let marker = self.markers.remove(idx);
        self.revision += 1;

        debug!("Destroyed marker {}", marker);
        Some(marker)
    }

    /// Change the physical size of a live marker.
    pub fn set_size(&mut self, handle: MarkerHandle, size: MarkerSize) -> Result<()> {
        if !size.is_valid() {
            return Err(TrackerError::InvalidMarkerSize(size));
        }
        let marker = self
            .markers
            .iter_mut()
            .find(|m| m.handle == handle)
            .ok_or(TrackerError::UnknownMarker(handle))?;
        marker.size = size;
        self.revision += 1;
        Ok(())
    }

    /// Number of live markers.
    pub fn count(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Marker at ordinal position `index` (creation order).
    pub fn get(&self, index: usize) -> Option<&Marker> {
        self.markers.get(index)
    }

    pub fn find(&self, handle: MarkerHandle) -> Option<&Marker> {
        self.markers.iter().find(|m| m.handle == handle)
    }

    pub fn find_by_id(&self, id: i32) -> Option<&Marker> {
        self.markers.iter().find(|m| m.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Mutation counter; equal values mean an identical registry.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Drop every marker. Handle numbering continues from where it was.
    pub fn clear(&mut self) {
        if !self.markers.is_empty() {
            self.markers.clear();
            self.revision += 1;
        }
    }
}
