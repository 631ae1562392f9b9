use slotmap::{SlotMap, new_key_type};

new_key_type! {
    pub struct ListenerKey;
}

/// Notifications published by the animator.
#[derive(Debug, Clone, PartialEq)]
pub enum AnimatorEvent {
    /// Playback parameters or phase changed.
    Change {
        name: String,
        loop_count: i32,
        position: f32,
        speed: f32,
    },
    /// `play` started a clip.
    Start { name: String },
    /// The clip was released by an immediate stop.
    End { name: String },
}

type Listener = Box<dyn FnMut(&AnimatorEvent)>;

/// Fire-and-forget observer list.
///
/// Listeners run synchronously, in no particular order, during the call
/// that raised the event.
#[derive(Default)]
pub struct AnimatorSignals {
    listeners: SlotMap<ListenerKey, Listener>,
}

impl AnimatorSignals {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&AnimatorEvent) + 'static) -> ListenerKey {
        self.listeners.insert(Box::new(listener))
    }

    /// Returns false if the key was already removed.
    pub fn unsubscribe(&mut self, key: ListenerKey) -> bool {
        self.listeners.remove(key).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn emit(&mut self, event: &AnimatorEvent) {
        log::trace!("AnimatorEvent: {event:?}");
        for listener in self.listeners.values_mut() {
            listener(event);
        }
    }
}

impl std::fmt::Debug for AnimatorSignals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimatorSignals")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
