//! Mix-minus audio mixer
//!
//! Every lane receives the sum of all other lanes' latest frames. Lanes
//! without recent input or under the silence threshold are left out.

use std::sync::Arc;
use std::time::Duration;

use crate::audio::loudness::{db_to_amplitude, rms_dbfs};
use crate::constants::*;
use crate::error::MixerError;
use crate::mixer::clock::{Clock, SystemClock};
use crate::mixer::events::{MixerEvent, MixerObserver, Observers, SubscriptionId};
use crate::mixer::lane::Lane;
use crate::mixer::pool::LanePool;
use crate::protocol::{LaneId, LaneInfo, LaneLoudness, LaneName};

/// Mixer tuning parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixerSettings {
    /// Lanes whose last input is this old or older are not mixed
    pub stale_after: Duration,
    /// Lanes at or under this loudness are not mixed, must be 0 or negative
    pub silence_threshold_dbfs: f32,
}

impl Default for MixerSettings {
    fn default() -> Self {
        Self {
            stale_after: Duration::from_millis(DEFAULT_STALE_AFTER_MS),
            silence_threshold_dbfs: f32::NEG_INFINITY,
        }
    }
}

impl MixerSettings {
    pub fn validate(&self) -> Result<(), MixerError> {
        if !(self.silence_threshold_dbfs <= 0.0) {
            return Err(MixerError::InvalidParameter(format!(
                "silence_threshold_dbfs must be 0 or negative, but got {}",
                self.silence_threshold_dbfs
            )));
        }
        Ok(())
    }
}

/// The mixing engine, sole owner of all lanes
pub struct AudioMixer {
    /// Lane storage indexed by lane id
    slots: Vec<Option<Lane>>,
    /// Live lane ids in creation order
    order: Vec<LaneId>,
    pool: LanePool,
    settings: MixerSettings,
    clock: Arc<dyn Clock>,
    observers: Observers,
}

impl AudioMixer {
    /// Create a mixer using the system clock
    pub fn new(settings: MixerSettings) -> Result<Self, MixerError> {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    /// Create a mixer with an injected clock
    pub fn with_clock(settings: MixerSettings, clock: Arc<dyn Clock>) -> Result<Self, MixerError> {
        settings.validate()?;

        let mut slots = Vec::with_capacity(MAX_LANES);
        slots.resize_with(MAX_LANES, || None);

        Ok(Self {
            slots,
            order: Vec::with_capacity(MAX_LANES),
            pool: LanePool::new(),
            settings,
            clock,
            observers: Observers::default(),
        })
    }

    /// Create a new lane with the smallest free id
    pub fn create_lane(&mut self) -> Result<LaneId, MixerError> {
        let lane_id = self
            .pool
            .allocate()
            .ok_or(MixerError::MaxLanesReached(MAX_LANES))?;

        let lane = Lane::new(lane_id, self.clock.now());
        let info = lane.info();
        self.slots[lane_id.index()] = Some(lane);
        self.order.push(lane_id);

        tracing::info!("Lane {} created ({} live)", lane_id, self.order.len());
        self.observers.notify(&MixerEvent::LaneCreated(info));

        Ok(lane_id)
    }

    /// Accept one frame from a lane and return its mix of every other lane
    pub fn lane_io(
        &mut self,
        lane_id: LaneId,
        frame: &[f32],
        name: &LaneName,
    ) -> Result<Vec<f32>, MixerError> {
        if frame.len() != FRAME_SAMPLES {
            return Err(MixerError::InvalidFrameSize {
                expected: FRAME_SAMPLES,
                actual: frame.len(),
            });
        }

        let now = self.clock.now();
        let lane = self.lane_mut(lane_id)?;

        let amplitude = db_to_amplitude(lane.gain_db);
        lane.pcm.clear();
        lane.pcm.extend(frame.iter().map(|s| s * amplitude));
        lane.last_input_at = now;
        lane.loudness_dbfs = rms_dbfs(&lane.pcm);

        let renamed = if lane.name != *name {
            lane.name = name.clone();
            Some(lane.info())
        } else {
            None
        };
        if let Some(info) = renamed {
            tracing::debug!("Lane {} renamed to {:?}", lane_id, info.name.as_str());
            self.observers.notify(&MixerEvent::LaneModified(info));
        }

        let mut mixed = vec![0.0f32; FRAME_SAMPLES];
        for other in self.live_lanes() {
            // Own input first, then the staleness and silence filters
            if other.id == lane_id {
                continue;
            }
            if now.saturating_duration_since(other.last_input_at) >= self.settings.stale_after {
                continue;
            }
            if !(other.loudness_dbfs > self.settings.silence_threshold_dbfs) {
                continue;
            }

            for (out, sample) in mixed.iter_mut().zip(&other.pcm) {
                *out += sample;
            }
        }

        for sample in &mut mixed {
            *sample = sample.clamp(-1.0, 1.0);
        }

        Ok(mixed)
    }

    /// Snapshot of every live lane's name and gain, in creation order
    pub fn get_lane_roster(&self) -> Vec<LaneInfo> {
        self.live_lanes().map(Lane::info).collect()
    }

    /// Snapshot of every live lane's loudness in creation order
    ///
    /// Values are clamped into -80 ~ 0 dBFS.
    pub fn get_lane_loudness(&self) -> Vec<LaneLoudness> {
        self.live_lanes()
            .map(|lane| {
                let dbfs = lane.loudness_dbfs.max(MIN_LOUDNESS_DBFS).min(MAX_LOUDNESS_DBFS);
                LaneLoudness::new(lane.id, dbfs)
            })
            .collect()
    }

    /// Set a lane gain in dB
    ///
    /// Over 80 dB is rejected, under -80 dB is stored as -80 dB.
    pub fn set_lane_gain(&mut self, lane_id: LaneId, gain_db: f32) -> Result<(), MixerError> {
        let lane = self.lane_mut(lane_id)?;

        if gain_db.is_nan() || gain_db > MAX_GAIN_DB {
            return Err(MixerError::GainOutOfRange(gain_db));
        }

        lane.gain_db = gain_db.max(MIN_GAIN_DB);
        tracing::debug!("Lane {} gain set to {:.2} dB", lane_id, lane.gain_db);
        Ok(())
    }

    /// Delete a lane and free its id
    pub fn delete_lane(&mut self, lane_id: LaneId) -> Result<(), MixerError> {
        self.lane_mut(lane_id)?;

        self.slots[lane_id.index()] = None;
        self.order.retain(|id| *id != lane_id);
        self.pool.release(lane_id);

        tracing::info!("Lane {} deleted ({} live)", lane_id, self.order.len());
        self.observers.notify(&MixerEvent::LaneDeleted(lane_id));

        Ok(())
    }

    /// Register an observer for lifecycle events
    pub fn subscribe(&mut self, observer: Arc<dyn MixerObserver>) -> SubscriptionId {
        self.observers.subscribe(observer)
    }

    /// Remove an observer, `false` if it was not registered
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub fn lane_count(&self) -> usize {
        self.pool.len()
    }

    pub fn contains(&self, lane_id: LaneId) -> bool {
        self.pool.contains(lane_id)
    }

    fn live_lanes(&self) -> impl Iterator<Item = &Lane> {
        self.order
            .iter()
            .filter_map(|id| self.slots[id.index()].as_ref())
    }

    fn lane_mut(&mut self, lane_id: LaneId) -> Result<&mut Lane, MixerError> {
        self.slots[lane_id.index()]
            .as_mut()
            .ok_or(MixerError::NonExistingLane(lane_id.get()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mixer::clock::ManualClock;
    use parking_lot::Mutex;
    use proptest::prelude::*;

    fn name(s: &str) -> LaneName {
        LaneName::new(s).unwrap()
    }

    fn mixer_with_clock(settings: MixerSettings) -> (AudioMixer, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let mixer = AudioMixer::with_clock(settings, clock.clone()).unwrap();
        (mixer, clock)
    }

    /// Deterministic pseudo-random frame in -scale ~ scale
    fn frame(seed: u32, scale: f32) -> Vec<f32> {
        let mut state = seed;
        (0..FRAME_SAMPLES)
            .map(|_| {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                ((state >> 8) as f32 / (1u32 << 24) as f32 * 2.0 - 1.0) * scale
            })
            .collect()
    }

    fn silent() -> Vec<f32> {
        vec![0.0; FRAME_SAMPLES]
    }

    fn assert_close(actual: &[f32], expected: &[f32]) {
        assert_eq!(actual.len(), expected.len());
        for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
            assert!((a - e).abs() < 1e-6, "sample {}: {} != {}", i, a, e);
        }
    }

    #[test]
    fn test_mixes_other_lanes() {
        let (mut mixer, _) = mixer_with_clock(MixerSettings::default());
        let l0 = mixer.create_lane().unwrap();
        let l1 = mixer.create_lane().unwrap();
        let l2 = mixer.create_lane().unwrap();

        let mut f0 = frame(1, 0.4);
        f0[..3].copy_from_slice(&[0.0, 0.5, 0.125]);
        let mut f1 = frame(2, 0.4);
        f1[..3].copy_from_slice(&[0.125, 0.25, 0.5]);

        mixer.lane_io(l0, &f0, &name("L0")).unwrap();
        mixer.lane_io(l1, &f1, &name("L1")).unwrap();
        let mixed = mixer.lane_io(l2, &silent(), &name("L2")).unwrap();

        let expected: Vec<f32> = f0.iter().zip(&f1).map(|(a, b)| (a + b).clamp(-1.0, 1.0)).collect();
        assert_close(&mixed, &expected);
        assert_close(&mixed[..3], &[0.125, 0.75, 0.625]);
    }

    #[test]
    fn test_own_input_excluded() {
        let (mut mixer, _) = mixer_with_clock(MixerSettings::default());
        let l0 = mixer.create_lane().unwrap();
        let l1 = mixer.create_lane().unwrap();

        let f1 = frame(3, 0.5);
        mixer.lane_io(l1, &f1, &name("L1")).unwrap();

        let back = mixer.lane_io(l1, &frame(4, 0.5), &name("L1")).unwrap();
        assert_eq!(back, silent());

        let other = mixer.lane_io(l0, &silent(), &name("L0")).unwrap();
        assert_close(&other, &frame(4, 0.5));
    }

    #[test]
    fn test_mix_clipping() {
        let (mut mixer, _) = mixer_with_clock(MixerSettings::default());
        let l0 = mixer.create_lane().unwrap();
        let l1 = mixer.create_lane().unwrap();
        let l2 = mixer.create_lane().unwrap();

        let mut f0 = frame(5, 0.1);
        f0[0] = 0.9;
        f0[1] = -0.9;
        let mut f1 = frame(6, 0.1);
        f1[0] = 0.2;
        f1[1] = -0.2;

        mixer.lane_io(l0, &f0, &name("L0")).unwrap();
        mixer.lane_io(l1, &f1, &name("L1")).unwrap();
        let mixed = mixer.lane_io(l2, &silent(), &name("L2")).unwrap();

        assert_eq!(mixed[0], 1.0);
        assert_eq!(mixed[1], -1.0);
    }

    #[test]
    fn test_gain_scales_before_mixing() {
        let (mut mixer, _) = mixer_with_clock(MixerSettings::default());
        let l0 = mixer.create_lane().unwrap();
        let l1 = mixer.create_lane().unwrap();

        let unit = vec![1.0f32; FRAME_SAMPLES];
        mixer.set_lane_gain(l0, -20.0).unwrap();
        mixer.lane_io(l0, &unit, &name("L0")).unwrap();
        let mixed = mixer.lane_io(l1, &silent(), &name("L1")).unwrap();
        assert!(mixed.iter().all(|s| (s - 0.1).abs() < 1e-7));

        let quiet = frame(7, 0.1);
        mixer.set_lane_gain(l0, 20.0).unwrap();
        mixer.lane_io(l0, &quiet, &name("L0")).unwrap();
        let mixed = mixer.lane_io(l1, &silent(), &name("L1")).unwrap();
        let expected: Vec<f32> = quiet.iter().map(|s| s * db_to_amplitude(20.0)).collect();
        assert_close(&mixed, &expected);
    }

    #[test]
    fn test_stale_lane_excluded() {
        let (mut mixer, clock) = mixer_with_clock(MixerSettings {
            stale_after: Duration::from_millis(10),
            ..Default::default()
        });
        let l0 = mixer.create_lane().unwrap();
        let l1 = mixer.create_lane().unwrap();

        mixer.lane_io(l0, &frame(8, 1.0), &name("L0")).unwrap();

        clock.advance(Duration::from_millis(9));
        let fresh = mixer.lane_io(l1, &silent(), &name("L1")).unwrap();
        assert_ne!(fresh, silent());

        clock.advance(Duration::from_millis(1));
        let stale = mixer.lane_io(l1, &silent(), &name("L1")).unwrap();
        assert_eq!(stale, silent());
    }

    #[test]
    fn test_silent_lane_excluded() {
        let (mut mixer, _) = mixer_with_clock(MixerSettings {
            silence_threshold_dbfs: -20.0,
            ..Default::default()
        });
        let l0 = mixer.create_lane().unwrap();
        let l1 = mixer.create_lane().unwrap();

        // Around -24.8 dBFS, under the threshold
        mixer.lane_io(l0, &frame(9, 0.1), &name("L0")).unwrap();
        let mixed = mixer.lane_io(l1, &silent(), &name("L1")).unwrap();
        assert_eq!(mixed, silent());

        mixer.lane_io(l0, &frame(9, 1.0), &name("L0")).unwrap();
        let mixed = mixer.lane_io(l1, &silent(), &name("L1")).unwrap();
        assert_ne!(mixed, silent());
    }

    #[test]
    fn test_loudness_equal_to_threshold_excluded() {
        let fed = vec![0.5f32; FRAME_SAMPLES];
        let level = rms_dbfs(&fed);

        let mix_with_threshold = |silence_threshold_dbfs: f32| {
            let (mut mixer, _) = mixer_with_clock(MixerSettings {
                silence_threshold_dbfs,
                ..Default::default()
            });
            let l0 = mixer.create_lane().unwrap();
            let l1 = mixer.create_lane().unwrap();
            mixer.lane_io(l0, &fed, &name("L0")).unwrap();
            mixer.lane_io(l1, &silent(), &name("L1")).unwrap()
        };

        assert_eq!(mix_with_threshold(level), silent());

        let lower = f32::from_bits(level.to_bits() + 1);
        assert!(lower < level);
        assert_eq!(mix_with_threshold(lower), fed);
    }

    #[test]
    fn test_lane_capacity_and_reuse() {
        let mut mixer = AudioMixer::new(MixerSettings::default()).unwrap();
        for expected in 0..MAX_LANES {
            assert_eq!(mixer.create_lane().unwrap().index(), expected);
        }
        assert_eq!(mixer.create_lane(), Err(MixerError::MaxLanesReached(MAX_LANES)));

        mixer.delete_lane(LaneId::new(42)).unwrap();
        mixer.delete_lane(LaneId::new(7)).unwrap();
        assert_eq!(mixer.create_lane(), Ok(LaneId::new(7)));
        assert_eq!(mixer.create_lane(), Ok(LaneId::new(42)));
        assert_eq!(mixer.lane_count(), MAX_LANES);
    }

    #[test]
    fn test_roster_and_loudness_snapshots() {
        let (mut mixer, _) = mixer_with_clock(MixerSettings::default());
        let l0 = mixer.create_lane().unwrap();
        let l1 = mixer.create_lane().unwrap();
        let l2 = mixer.create_lane().unwrap();
        mixer.delete_lane(l0).unwrap();
        let l0_again = mixer.create_lane().unwrap();
        assert_eq!(l0_again, l0);

        mixer.set_lane_gain(l1, 10.0).unwrap();
        mixer.set_lane_gain(l2, -5.0).unwrap();
        let f = frame(10, 0.1);
        mixer.lane_io(l1, &f, &name("L1")).unwrap();
        mixer.lane_io(l2, &f, &name("L2")).unwrap();

        let roster = mixer.get_lane_roster();
        let ids: Vec<LaneId> = roster.iter().map(|i| i.lane_id).collect();
        assert_eq!(ids, vec![l1, l2, l0]);
        assert_eq!(roster[0], LaneInfo::new(l1, name("L1"), 10.0));
        assert_eq!(roster[1], LaneInfo::new(l2, name("L2"), -5.0));
        assert_eq!(roster[2], LaneInfo::new(l0, name("NEW"), 0.0));

        let loudness = mixer.get_lane_loudness();
        let scaled: Vec<f32> = f.iter().map(|s| s * db_to_amplitude(10.0)).collect();
        assert_eq!(loudness[0].lane_id, l1);
        assert!((loudness[0].loudness_dbfs - rms_dbfs(&scaled)).abs() < 1e-4);
        // Never fed, silence reports as the floor
        assert_eq!(loudness[2], LaneLoudness::new(l0, MIN_LOUDNESS_DBFS));
    }

    #[test]
    fn test_loudness_snapshot_clamps_above_full_scale() {
        let (mut mixer, _) = mixer_with_clock(MixerSettings::default());
        let l0 = mixer.create_lane().unwrap();
        mixer.set_lane_gain(l0, 80.0).unwrap();
        mixer.lane_io(l0, &vec![0.5; FRAME_SAMPLES], &name("L0")).unwrap();
        assert_eq!(mixer.get_lane_loudness()[0].loudness_dbfs, MAX_LOUDNESS_DBFS);
    }

    #[test]
    fn test_gain_bounds() {
        let mut mixer = AudioMixer::new(MixerSettings::default()).unwrap();
        let lane = mixer.create_lane().unwrap();

        assert_eq!(
            mixer.set_lane_gain(lane, 80.0001),
            Err(MixerError::GainOutOfRange(80.0001))
        );
        assert!(mixer.set_lane_gain(lane, f32::NAN).is_err());
        assert_eq!(mixer.get_lane_roster()[0].gain_db, 0.0);

        mixer.set_lane_gain(lane, -500.0).unwrap();
        assert_eq!(mixer.get_lane_roster()[0].gain_db, -80.0);

        mixer.set_lane_gain(lane, 80.0).unwrap();
        assert_eq!(mixer.get_lane_roster()[0].gain_db, 80.0);
    }

    #[test]
    fn test_events() {
        let (mut mixer, _) = mixer_with_clock(MixerSettings::default());
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let subscription =
            mixer.subscribe(Arc::new(move |e: &MixerEvent| sink.lock().push(e.clone())));

        let lane = mixer.create_lane().unwrap();
        mixer.set_lane_gain(lane, 6.0).unwrap();
        mixer.lane_io(lane, &silent(), &name("L0")).unwrap();
        // Same name again, no event
        mixer.lane_io(lane, &silent(), &name("L0")).unwrap();
        mixer.delete_lane(lane).unwrap();

        assert_eq!(
            *events.lock(),
            vec![
                MixerEvent::LaneCreated(LaneInfo::new(lane, name("NEW"), 0.0)),
                MixerEvent::LaneModified(LaneInfo::new(lane, name("L0"), 6.0)),
                MixerEvent::LaneDeleted(lane),
            ]
        );

        assert!(mixer.unsubscribe(subscription));
        mixer.create_lane().unwrap();
        assert_eq!(events.lock().len(), 3);
    }

    #[test]
    fn test_unknown_lane() {
        let mut mixer = AudioMixer::new(MixerSettings::default()).unwrap();
        assert_eq!(mixer.set_lane_gain(LaneId::new(0), 0.0), Err(MixerError::NonExistingLane(0)));

        let lane = mixer.create_lane().unwrap();
        mixer.delete_lane(lane).unwrap();
        assert_eq!(mixer.delete_lane(lane), Err(MixerError::NonExistingLane(0)));
        assert_eq!(
            mixer.lane_io(lane, &silent(), &name("L0")),
            Err(MixerError::NonExistingLane(0))
        );
    }

    #[test]
    fn test_invalid_frame_size_leaves_state() {
        let (mut mixer, _) = mixer_with_clock(MixerSettings::default());
        let lane = mixer.create_lane().unwrap();

        for len in [FRAME_SAMPLES - 1, FRAME_SAMPLES + 1] {
            assert_eq!(
                mixer.lane_io(lane, &vec![0.5; len], &name("BAD")),
                Err(MixerError::InvalidFrameSize { expected: FRAME_SAMPLES, actual: len })
            );
        }
        assert_eq!(mixer.get_lane_roster()[0].name, name("NEW"));
    }

    #[test]
    fn test_invalid_settings() {
        let settings = MixerSettings {
            silence_threshold_dbfs: 0.1,
            ..Default::default()
        };
        assert!(matches!(
            AudioMixer::new(settings),
            Err(MixerError::InvalidParameter(_))
        ));

        let zero = MixerSettings {
            silence_threshold_dbfs: 0.0,
            stale_after: Duration::ZERO,
        };
        assert!(AudioMixer::new(zero).is_ok());
    }

    fn frame_strategy() -> impl Strategy<Value = Vec<f32>> {
        proptest::collection::vec(-1.0f32..=1.0, FRAME_SAMPLES)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn mix_is_clamped_sum_of_other_scaled_frames(
            f0 in frame_strategy(),
            f1 in frame_strategy(),
            g0 in -80.0f32..=80.0,
            g1 in -80.0f32..=80.0,
        ) {
            let (mut mixer, _) = mixer_with_clock(MixerSettings::default());
            let l0 = mixer.create_lane().unwrap();
            let l1 = mixer.create_lane().unwrap();
            let l2 = mixer.create_lane().unwrap();
            mixer.set_lane_gain(l0, g0).unwrap();
            mixer.set_lane_gain(l1, g1).unwrap();

            let s0: Vec<f32> = f0.iter().map(|s| s * db_to_amplitude(g0)).collect();
            let s1: Vec<f32> = f1.iter().map(|s| s * db_to_amplitude(g1)).collect();

            mixer.lane_io(l0, &f0, &name("L0")).unwrap();
            let back_to_l1 = mixer.lane_io(l1, &f1, &name("L1")).unwrap();
            let to_l2 = mixer.lane_io(l2, &silent(), &name("L2")).unwrap();

            let expected: Vec<f32> = s0.iter().zip(&s1).map(|(a, b)| (a + b).clamp(-1.0, 1.0)).collect();
            prop_assert_eq!(to_l2, expected);

            let own_excluded: Vec<f32> = s0.iter().map(|a| a.clamp(-1.0, 1.0)).collect();
            prop_assert_eq!(back_to_l1, own_excluded);
        }
    }
}
