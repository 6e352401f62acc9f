//! Finalization diagnostics
//!
//! Submaps report what their finalization produced to an injected observer
//! instead of printing it. [`LogObserver`] forwards to the `log` facade;
//! [`RecordingObserver`] keeps the reports for later inspection.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use glam::Vec3;
use log::{error, info};
use serde::Serialize;

use crate::submap::SubmapId;

/// Counts produced by one finalization
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FinishStats {
    pub relevant_voxels: usize,
    pub isosurface_vertices: usize,
    /// Mesh vertices outside interpolatable space
    pub skipped_vertices: usize,
    /// Mesh vertices whose interpolated distance was not close to zero
    pub inconsistent_vertices: usize,
}

pub trait SubmapObserver: Send + Sync {
    fn on_submap_finished(&self, id: SubmapId, stats: &FinishStats);

    /// An isosurface vertex interpolated to a distance far from zero
    fn on_isosurface_inconsistency(&self, id: SubmapId, position: Vec3, distance: f32);
}

/// Reports through the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl SubmapObserver for LogObserver {
    fn on_submap_finished(&self, id: SubmapId, stats: &FinishStats) {
        info!(
            "submap {} finished: {} relevant voxels, {} isosurface vertices",
            id, stats.relevant_voxels, stats.isosurface_vertices
        );
    }

    fn on_isosurface_inconsistency(&self, id: SubmapId, position: Vec3, distance: f32) {
        error!(
            "submap {}: isosurface vertex at {} interpolates to distance {}",
            id, position, distance
        );
    }
}

/// Keeps every report in memory
#[derive(Debug, Default)]
pub struct RecordingObserver {
    finished: Mutex<Vec<(SubmapId, FinishStats)>>,
    inconsistencies: AtomicUsize,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finished(&self) -> Vec<(SubmapId, FinishStats)> {
        self.finished
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn last_stats(&self, id: SubmapId) -> Option<FinishStats> {
        self.finished()
            .into_iter()
            .rev()
            .find(|(submap_id, _)| *submap_id == id)
            .map(|(_, stats)| stats)
    }

    pub fn num_inconsistencies(&self) -> usize {
        self.inconsistencies.load(Ordering::Relaxed)
    }
}

impl SubmapObserver for RecordingObserver {
    fn on_submap_finished(&self, id: SubmapId, stats: &FinishStats) {
        self.finished
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((id, *stats));
    }

    fn on_isosurface_inconsistency(&self, id: SubmapId, position: Vec3, distance: f32) {
        error!(
            "submap {}: isosurface vertex at {} interpolates to distance {}",
            id, position, distance
        );
        self.inconsistencies.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_observer() {
        let observer = RecordingObserver::new();
        let stats = FinishStats {
            relevant_voxels: 3,
            isosurface_vertices: 2,
            ..Default::default()
        };

        observer.on_submap_finished(1, &stats);
        observer.on_submap_finished(2, &FinishStats::default());
        observer.on_isosurface_inconsistency(1, Vec3::ZERO, 0.5);

        assert_eq!(observer.finished().len(), 2);
        assert_eq!(observer.last_stats(1), Some(stats));
        assert_eq!(observer.last_stats(3), None);
        assert_eq!(observer.num_inconsistencies(), 1);
    }
}
