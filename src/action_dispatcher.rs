use std::io;

use evdev::{uinput::VirtualDevice, EventType, InputEvent, KeyCode as Key};
use log::debug;

use crate::{action::Action, event::KeyEvent};

// Where synthesized events go. Every sent event has to be visible downstream before the next one.
pub trait EventSink {
    fn send(&mut self, event: InputEvent) -> io::Result<()>;
}

impl EventSink for VirtualDevice {
    // emit() appends a SYN_REPORT to each call
    fn send(&mut self, event: InputEvent) -> io::Result<()> {
        self.emit(&[event])
    }
}

pub struct ActionDispatcher<S: EventSink = VirtualDevice> {
    // Device to emit events
    sink: S,
}

impl<S: EventSink> ActionDispatcher<S> {
    pub fn new(sink: S) -> ActionDispatcher<S> {
        ActionDispatcher { sink }
    }

    // Execute Actions created by EventHandler. This should be the only public method of ActionDispatcher.
    pub fn on_action(&mut self, action: Action) -> io::Result<()> {
        match action {
            Action::KeyEvent(key_event) => self.on_key_event(key_event),
            Action::InputEvent(event) => self.send_event(event),
        }
    }

    fn on_key_event(&mut self, event: KeyEvent) -> io::Result<()> {
        let event = InputEvent::new(EventType::KEY.0, event.code(), event.value());
        self.send_event(event)
    }

    fn send_event(&mut self, event: InputEvent) -> io::Result<()> {
        if event.event_type() == EventType::KEY {
            debug!("{}: {:?}", event.value(), Key::new(event.code()))
        }
        self.sink.send(event)
    }

    #[cfg(test)]
    pub fn sink(&self) -> &S {
        &self.sink
    }
}
