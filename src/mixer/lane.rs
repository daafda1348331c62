//! Per-source lane state

use std::time::Instant;

use crate::constants::FRAME_SAMPLES;
use crate::protocol::{LaneId, LaneInfo, LaneName};

/// One audio source bound to one connection
#[derive(Debug, Clone)]
pub(crate) struct Lane {
    pub id: LaneId,
    /// Last accepted frame, already gain-scaled
    pub pcm: Vec<f32>,
    pub name: LaneName,
    /// Always within -80 ~ 80
    pub gain_db: f32,
    pub last_input_at: Instant,
    /// Measured on the scaled frame, may be -inf or above 0 dBFS
    pub loudness_dbfs: f32,
}

impl Lane {
    pub fn new(id: LaneId, now: Instant) -> Self {
        Self {
            id,
            pcm: vec![0.0; FRAME_SAMPLES],
            name: LaneName::initial(),
            gain_db: 0.0,
            last_input_at: now,
            loudness_dbfs: f32::NEG_INFINITY,
        }
    }

    pub fn info(&self) -> LaneInfo {
        LaneInfo::new(self.id, self.name.clone(), self.gain_db)
    }
}
