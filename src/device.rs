use std::collections::HashMap;
use std::fs::read_dir;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::prelude::AsRawFd;
use std::path::PathBuf;
use std::{io, process};

use anyhow::bail;
use derive_where::derive_where;
use evdev::raw_stream::RawDevice;
use evdev::uinput::VirtualDevice;
use evdev::{AttributeSet, EventType, InputEvent, KeyCode as Key};
use log::{debug, warn};

use crate::event::Event;
use crate::keyboard::KEY_CNT;

const SYN_REPORT: u16 = 0;
const SYN_DROPPED: u16 = 3;

// Credit: https://github.com/mooz/xkeysnail/blob/bf3c93b4fe6efd42893db4e6588e5ef1c4909cfb/xkeysnail/output.py#L10-L32
pub fn output_device() -> io::Result<VirtualDevice> {
    let mut keys: AttributeSet<Key> = AttributeSet::new();
    for code in 0..KEY_CNT as u16 {
        let key = Key::new(code);
        if format!("{:?}", key).starts_with("KEY_") {
            keys.insert(key);
        }
    }

    let device = VirtualDevice::builder()?
        .name(&InputDevice::current_name())
        .with_keys(&keys)?
        .build()?;
    Ok(device)
}

pub fn get_input_devices(device_opts: &[String], ignore_opts: &[String]) -> anyhow::Result<HashMap<PathBuf, InputDevice>> {
    let mut candidates: Vec<_> = InputDevice::devices()?.collect();
    candidates.sort();
    print_devices("Selecting devices from the following list:", &candidates);

    let mut selection = match device_opts {
        [] => "Selected keyboards automatically since --device options weren't specified".to_string(),
        _ => format!("Selected devices matching {:?}", device_opts),
    };
    if !ignore_opts.is_empty() {
        selection.push_str(&format!(", ignoring {:?}", ignore_opts));
    }

    // A device that can't be grabbed is skipped
    let mut selected = vec![];
    for mut device in candidates {
        if device.is_input_device(device_opts, ignore_opts) && device.grab() {
            selected.push(device);
        }
    }
    if selected.is_empty() {
        bail!("No device was selected!");
    }
    print_devices(&format!("{}:", selection), &selected);

    Ok(selected.into_iter().map(From::from).collect())
}

fn print_devices(title: &str, devices: &[InputDevice]) {
    println!("{}", title);
    println!("{}", SEPARATOR);
    devices.iter().for_each(InputDevice::print);
    println!("{}", SEPARATOR);
}

#[derive_where(PartialEq, PartialOrd, Ord)]
pub struct InputDevice {
    path: PathBuf,
    #[derive_where(skip)]
    device: RawDevice,
    // Between SYN_DROPPED and the next SYN_REPORT
    #[derive_where(skip)]
    dropping: bool,
}

impl Eq for InputDevice {}

impl TryFrom<PathBuf> for InputDevice {
    type Error = io::Error;

    fn try_from(path: PathBuf) -> Result<Self, Self::Error> {
        let fname = path
            .file_name()
            .ok_or_else(|| io::Error::from(io::ErrorKind::InvalidInput))?;
        if fname.as_bytes().starts_with(b"event") {
            Ok(Self {
                device: RawDevice::open(&path)?,
                path,
                dropping: false,
            })
        } else {
            Err(io::ErrorKind::InvalidInput.into())
        }
    }
}

impl From<InputDevice> for (PathBuf, InputDevice) {
    fn from(device: InputDevice) -> Self {
        (device.path.clone(), device)
    }
}

impl AsRawFd for InputDevice {
    fn as_raw_fd(&self) -> std::os::unix::prelude::RawFd {
        self.device.as_raw_fd()
    }
}

/// Device Wrappers Abstractions
impl InputDevice {
    pub fn grab(&mut self) -> bool {
        match self.device.grab() {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to grab {} ({}): {}", self.path.display(), self.device_name(), e);
                false
            }
        }
    }

    pub fn ungrab(&mut self) {
        if let Err(e) = self.device.ungrab() {
            warn!("Failed to ungrab {} ({}): {}", self.path.display(), self.device_name(), e);
        }
    }

    // Raw events are read so that dropped events are noticed here instead of being
    // reconciled silently by evdev.
    pub fn fetch_events(&mut self) -> io::Result<Vec<Event>> {
        let events: Vec<InputEvent> = self.device.fetch_events()?.collect();
        let events = resync_filter(&mut self.dropping, events);
        if events.iter().any(|event| matches!(event, Event::Resync)) {
            debug!("{}: events were dropped", self.path.display());
        }
        Ok(events)
    }

    fn device_name(&self) -> &str {
        self.device.name().unwrap_or("<Unnamed device>")
    }
}

impl InputDevice {
    pub fn is_input_device(&self, device_filter: &[String], ignore_filter: &[String]) -> bool {
        if self.device_name() == Self::current_name() {
            return false;
        }
        (if device_filter.is_empty() {
            self.is_keyboard()
        } else {
            self.matches(device_filter)
        }) && (ignore_filter.is_empty() || !self.matches(ignore_filter))
    }

    // We can't know the device path from evdev::enumerate(). So we re-implement it.
    fn devices() -> io::Result<impl Iterator<Item = InputDevice>> {
        Ok(read_dir("/dev/input")?.filter_map(|entry| {
            // Allow "Permission denied" when opening the current process's own device.
            InputDevice::try_from(entry.ok()?.path()).ok()
        }))
    }

    pub fn current_name() -> String {
        format!("comboremap pid={}", process::id())
    }

    fn matches(&self, filter: &[String]) -> bool {
        let file_name = self.path.file_name().map(|name| name.as_bytes()).unwrap_or_default();
        filter
            .iter()
            .any(|device_opt| matches_filter(self.path.as_os_str().as_bytes(), file_name, self.device_name(), device_opt))
    }

    fn is_keyboard(&self) -> bool {
        // Credit: https://github.com/mooz/xkeysnail/blob/bf3c93b4fe6efd42893db4e6588e5ef1c4909cfb/xkeysnail/input.py#L17-L32
        match self.device.supported_keys() {
            Some(keys) => {
                keys.contains(Key::KEY_SPACE)
                && keys.contains(Key::KEY_A)
                && keys.contains(Key::KEY_Z)
                // BTN_MOUSE
                && !keys.contains(Key::BTN_LEFT)
            }
            None => false,
        }
    }

    pub fn print(&self) {
        println!("{:18}: {}", self.path.display(), self.device_name())
    }
}

// Exact path or name, eventXX for /dev/input/eventXX, or a part of the name
fn matches_filter(path: &[u8], file_name: &[u8], device_name: &str, device_opt: &str) -> bool {
    path == device_opt.as_bytes()
        || device_name == device_opt
        || (device_opt.starts_with("event") && file_name == device_opt.as_bytes())
        || device_name.contains(device_opt)
}

// After SYN_DROPPED, everything up to and including the next SYN_REPORT is incomplete.
// It's discarded and replaced by a single Event::Resync.
fn resync_filter(dropping: &mut bool, events: impl IntoIterator<Item = InputEvent>) -> Vec<Event> {
    let mut result = vec![];
    for event in events {
        let is_syn = event.event_type() == EventType::SYNCHRONIZATION;
        if is_syn && event.code() == SYN_DROPPED {
            *dropping = true;
        } else if *dropping {
            if is_syn && event.code() == SYN_REPORT {
                *dropping = false;
                result.push(Event::Resync);
            }
        } else if let Some(event) = Event::new(event) {
            result.push(event);
        }
    }
    result
}

const SEPARATOR: &str = "------------------------------------------------------------------------------";
