//! Typed events the playback core emits outward, consumed by UI and OS
//! media-session integration (both out of scope here; this module only
//! specifies the wire contract between the core and those collaborators).
//!
//! Grounded on the teacher's `mpsc::Sender<PlayerMessage>` pattern in
//! `player.rs`, generalised from one enum serving both directions into a
//! dedicated outbound bus plus the operations already named in `engine.rs`.

use std::sync::mpsc::{self, Receiver, Sender};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Playing,
    Paused,
    Stopped,
}

/// One outbound notification. `Seeked` carries microseconds to match the
/// MPRIS-style consumers spec.md names as an external collaborator.
#[derive(Debug, Clone)]
pub enum Event {
    PlaybackStatus(PlaybackStatus),
    Seeked(i64),
    TrackChanged { node_id: i32, file_path: String },
    VolumeChanged(u8),
    Error(String),
}

/// An mpsc-backed fan-out point. The core holds the `Sender` side and emits
/// freely; subscribers (UI, OS integration) drain the `Receiver`. Only one
/// receiver is supported at a time, matching the teacher's single-consumer
/// channel usage — a future multi-subscriber UI would wrap this in a
/// broadcast channel instead.
pub struct EventBus {
    sender: Sender<Event>,
    receiver: Option<Receiver<Event>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver: Some(receiver),
        }
    }

    /// Takes ownership of the receiving end. Panics if called twice; the
    /// bus is meant to have exactly one subscriber.
    pub fn subscribe(&mut self) -> Receiver<Event> {
        self.receiver
            .take()
            .expect("EventBus already has a subscriber")
    }

    pub fn emit(&self, event: Event) {
        // A dropped receiver (no subscriber) is not an error for the core:
        // the UI may not have attached yet.
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emitted_events_are_received_in_order() {
        let mut bus = EventBus::new();
        let rx = bus.subscribe();
        bus.emit(Event::PlaybackStatus(PlaybackStatus::Playing));
        bus.emit(Event::VolumeChanged(80));
        assert!(matches!(
            rx.recv().unwrap(),
            Event::PlaybackStatus(PlaybackStatus::Playing)
        ));
        assert!(matches!(rx.recv().unwrap(), Event::VolumeChanged(80)));
    }

    #[test]
    fn emit_without_subscriber_does_not_panic() {
        let bus = EventBus::new();
        bus.emit(Event::Error("boom".into()));
    }
}
