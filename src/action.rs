use evdev::InputEvent;

use crate::event::KeyEvent;

// Output of EventHandler, in the order it has to reach the virtual device
#[derive(Debug)]
pub enum Action {
    // A synthesized key press, repeat or release
    KeyEvent(KeyEvent),
    // A non-key event from the input device, forwarded as is
    InputEvent(InputEvent),
}
