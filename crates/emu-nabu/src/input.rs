//! Host events.
//!
//! The front end (window, terminal, script) never touches the machine
//! directly. It pushes [`HostEvent`]s into an [`InputSource`], and the
//! scheduler drains that source once per scanline. Key presses, the reset
//! button, and disk swaps therefore all land on a scanline boundary.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::keyboard_map::{Joystick, NabuKey};

/// Something the operator did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Key(NabuKey),
    KeyRelease(NabuKey),
    /// New state of one of the two joystick ports.
    Joystick { port: u8, state: Joystick },
    Reset,
    Quit,
    Insert { drive: usize, path: PathBuf },
    Eject { drive: usize },
}

/// Where the scheduler gets host events from.
pub trait InputSource {
    /// Next pending event. Must not block.
    fn poll(&mut self) -> Option<HostEvent>;
}

/// A source that never produces anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoInput;

impl InputSource for NoInput {
    fn poll(&mut self) -> Option<HostEvent> {
        None
    }
}

/// FIFO of events shared between a producer thread and the scheduler.
///
/// Clones share the same queue: hand one to the window thread, give the
/// other to [`Nabu::with_input`](crate::Nabu::with_input).
#[derive(Debug, Default, Clone)]
pub struct EventQueue {
    events: Arc<Mutex<VecDeque<HostEvent>>>,
}

impl EventQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: HostEvent) {
        self.events.lock().push_back(event);
    }

    /// Queue a key press followed by its release.
    pub fn tap(&self, key: NabuKey) {
        let mut events = self.events.lock();
        events.push_back(HostEvent::Key(key));
        events.push_back(HostEvent::KeyRelease(key));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl InputSource for EventQueue {
    fn poll(&mut self) -> Option<HostEvent> {
        self.events.lock().pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_input_is_always_empty() {
        let mut input = NoInput;
        assert_eq!(input.poll(), None);
    }

    #[test]
    fn queue_is_fifo() {
        let mut queue = EventQueue::new();
        queue.push(HostEvent::Reset);
        queue.push(HostEvent::Eject { drive: 1 });
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.poll(), Some(HostEvent::Reset));
        assert_eq!(queue.poll(), Some(HostEvent::Eject { drive: 1 }));
        assert_eq!(queue.poll(), None);
    }

    #[test]
    fn clones_share_the_queue() {
        let producer = EventQueue::new();
        let mut consumer = producer.clone();

        let handle = std::thread::spawn(move || producer.tap(NabuKey::Char(b'a')));
        handle.join().expect("producer thread panicked");

        assert_eq!(consumer.poll(), Some(HostEvent::Key(NabuKey::Char(b'a'))));
        assert_eq!(
            consumer.poll(),
            Some(HostEvent::KeyRelease(NabuKey::Char(b'a')))
        );
        assert!(consumer.is_empty());
    }
}
