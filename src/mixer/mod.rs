//! Mixing engine module

pub mod clock;
pub mod engine;
pub mod events;
pub mod pool;

mod lane;

use parking_lot::Mutex;
use std::sync::Arc;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{AudioMixer, MixerSettings};
pub use events::{MixerEvent, MixerObserver, SubscriptionId};
pub use pool::LanePool;

/// Mixer shared between connection tasks
pub type SharedMixer = Arc<Mutex<AudioMixer>>;

/// Wrap a mixer for sharing
pub fn shared(mixer: AudioMixer) -> SharedMixer {
    Arc::new(Mutex::new(mixer))
}
