//! Connection-scoped ownership guards

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::MixerError;
use crate::mixer::SharedMixer;
use crate::protocol::LaneId;

/// Admits at most one control connection at a time
#[derive(Debug, Clone, Default)]
pub struct ControlLock {
    held: Arc<AtomicBool>,
}

impl ControlLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lock, `None` while another holder has it
    pub fn try_acquire(&self) -> Option<ControlGuard> {
        self.held
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ControlGuard {
                held: self.held.clone(),
            })
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }
}

/// Held for the lifetime of the control connection, released on drop
#[derive(Debug)]
pub struct ControlGuard {
    held: Arc<AtomicBool>,
}

impl Drop for ControlGuard {
    fn drop(&mut self) {
        self.held.store(false, Ordering::Release);
    }
}

/// A lane owned by one audio connection
///
/// The lane is deleted exactly once, by `release` or on drop, whichever
/// comes first.
pub struct LaneLease {
    mixer: SharedMixer,
    lane_id: LaneId,
    released: bool,
}

impl LaneLease {
    /// Create a lane in the mixer
    pub fn create(mixer: &SharedMixer) -> Result<Self, MixerError> {
        let lane_id = mixer.lock().create_lane()?;
        Ok(Self {
            mixer: mixer.clone(),
            lane_id,
            released: false,
        })
    }

    pub fn lane_id(&self) -> LaneId {
        self.lane_id
    }

    /// Delete the lane, no-op after the first call
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if let Err(e) = self.mixer.lock().delete_lane(self.lane_id) {
            tracing::warn!("Failed to delete lane {}: {}", self.lane_id, e);
        }
    }
}

impl Drop for LaneLease {
    fn drop(&mut self) {
        self.release();
    }
}
