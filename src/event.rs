use evdev::{EventType, InputEvent, KeyCode as Key};

// Input to EventHandler
#[derive(Debug)]
pub enum Event {
    // InputEvent (EventType::KEY)
    KeyEvent(KeyEvent),
    // Any other non-SYN InputEvent. It's passed through untouched.
    OtherEvents(InputEvent),
    // The device dropped events and the buffered ones were discarded
    Resync,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    value: KeyValue,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyValue {
    Press,
    Release,
    Repeat,
}

impl Event {
    // Convert evdev's raw InputEvent to comboremap's internal Event
    pub fn new(event: InputEvent) -> Option<Event> {
        let event = match event.event_type() {
            EventType::KEY => Event::KeyEvent(KeyEvent::new_with(event.code(), event.value())?),
            EventType::SYNCHRONIZATION => return None,
            _ => Event::OtherEvents(event),
        };
        Some(event)
    }

    #[cfg(test)]
    pub fn key_press(key: Key) -> Event {
        Event::KeyEvent(KeyEvent::new(key, KeyValue::Press))
    }

    #[cfg(test)]
    pub fn key_repeat(key: Key) -> Event {
        Event::KeyEvent(KeyEvent::new(key, KeyValue::Repeat))
    }

    #[cfg(test)]
    pub fn key_release(key: Key) -> Event {
        Event::KeyEvent(KeyEvent::new(key, KeyValue::Release))
    }
}

impl KeyEvent {
    pub fn new(key: Key, value: KeyValue) -> KeyEvent {
        KeyEvent { key, value }
    }

    // Returns None for values the kernel never sends for EV_KEY
    pub fn new_with(code: u16, value: i32) -> Option<KeyEvent> {
        Some(KeyEvent::new(Key::new(code), KeyValue::new(value)?))
    }

    pub fn code(&self) -> u16 {
        self.key.code()
    }

    pub fn key_value(&self) -> KeyValue {
        self.value
    }

    pub fn value(&self) -> i32 {
        self.value.value()
    }
}

impl KeyValue {
    fn new(value: i32) -> Option<KeyValue> {
        let event_value = match value {
            0 => KeyValue::Release,
            1 => KeyValue::Press,
            2 => KeyValue::Repeat,
            _ => return None,
        };
        Some(event_value)
    }

    pub fn value(&self) -> i32 {
        match self {
            KeyValue::Release => 0,
            KeyValue::Press => 1,
            KeyValue::Repeat => 2,
        }
    }
}
