//! Lane lifecycle notifications

use std::sync::Arc;

use crate::protocol::{LaneId, LaneInfo};

/// Lifecycle event emitted by the mixer
#[derive(Debug, Clone, PartialEq)]
pub enum MixerEvent {
    /// A lane was created, always named "NEW" with 0 dB gain
    LaneCreated(LaneInfo),
    /// A lane's name changed
    LaneModified(LaneInfo),
    LaneDeleted(LaneId),
}

/// Receiver of mixer events
///
/// Called synchronously while the mixer is locked, so implementations must
/// not block or call back into the mixer.
pub trait MixerObserver: Send + Sync {
    fn on_event(&self, event: &MixerEvent);
}

impl<F> MixerObserver for F
where
    F: Fn(&MixerEvent) + Send + Sync,
{
    fn on_event(&self, event: &MixerEvent) {
        self(event)
    }
}

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Observer list, notified in registration order
#[derive(Default)]
pub(crate) struct Observers {
    entries: Vec<(SubscriptionId, Arc<dyn MixerObserver>)>,
    next_id: u64,
}

impl Observers {
    pub fn subscribe(&mut self, observer: Arc<dyn MixerObserver>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, observer));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub fn notify(&self, event: &MixerEvent) {
        for (_, observer) in &self.entries {
            observer.on_event(event);
        }
    }
}
