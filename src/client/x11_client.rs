use crate::client::Client;
use anyhow::Context;
use log::debug;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{Atom, AtomEnum, ChangeWindowAttributesAux, ConnectionExt, EventMask, Window};
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;

struct X11Connection {
    conn: RustConnection,
    root: Window,
    net_active_window: Atom,
}

pub struct X11Client {
    // Lazily initialized
    connection: Option<X11Connection>,
    supported: Option<bool>,
}

impl X11Client {
    pub fn new() -> X11Client {
        X11Client {
            connection: None,
            supported: None,
        }
    }

    fn connect() -> anyhow::Result<X11Connection> {
        let (conn, screen_num) = x11rb::connect(None).context("X11 connect failed")?;
        let root = conn.setup().roots[screen_num].root;
        let net_active_window = conn.intern_atom(false, b"_NET_ACTIVE_WINDOW")?.reply()?.atom;

        // _NET_ACTIVE_WINDOW changes are PropertyNotify events on the root window
        let attributes = ChangeWindowAttributesAux::new().event_mask(EventMask::PROPERTY_CHANGE);
        conn.change_window_attributes(root, &attributes)?.check()?;
        conn.flush()?;

        Ok(X11Connection {
            conn,
            root,
            net_active_window,
        })
    }

    fn connection(&mut self) -> anyhow::Result<&X11Connection> {
        if self.connection.is_none() {
            self.connection = Some(Self::connect()?);
        }
        self.connection.as_ref().context("X11 connection is missing")
    }
}

impl X11Connection {
    fn active_window(&self) -> anyhow::Result<Option<Window>> {
        let reply = self
            .conn
            .get_property(false, self.root, self.net_active_window, AtomEnum::WINDOW, 0, 1)?
            .reply()?;
        Ok(reply.value32().and_then(|mut windows| windows.next()).filter(|window| *window != 0))
    }

    fn wm_class(&self, window: Window) -> anyhow::Result<Option<String>> {
        let reply = self
            .conn
            .get_property(false, window, AtomEnum::WM_CLASS, AtomEnum::STRING, 0, 1024)?
            .reply()?;
        Ok(class_name(&reply.value))
    }

    fn current_wm_class(&self) -> anyhow::Result<String> {
        let class = match self.active_window()? {
            Some(window) => self.wm_class(window)?,
            None => None,
        };
        Ok(class.unwrap_or_default())
    }
}

impl Client for X11Client {
    fn supported(&mut self) -> bool {
        match self.supported {
            Some(supported) => supported,
            None => {
                let supported = match self.connection() {
                    Ok(_) => true,
                    Err(e) => {
                        debug!("X11Client is not supported: {:?}", e);
                        false
                    }
                };
                self.supported = Some(supported);
                supported
            }
        }
    }

    fn current_application(&mut self) -> Option<String> {
        if !self.supported() {
            return None;
        }
        let connection = self.connection().ok()?;
        match connection.current_wm_class() {
            Ok(class) => Some(class),
            Err(e) => {
                debug!("Failed to read WM_CLASS: {:?}", e);
                None
            }
        }
    }

    fn next_application(&mut self) -> anyhow::Result<Option<String>> {
        let connection = self.connection()?;
        loop {
            if let Event::PropertyNotify(event) = connection.conn.wait_for_event()? {
                if event.window == connection.root && event.atom == connection.net_active_window {
                    return Ok(Some(connection.current_wm_class()?));
                }
            }
        }
    }
}

// WM_CLASS is "instance\0class\0". The class is the second string.
fn class_name(wm_class: &[u8]) -> Option<String> {
    let class = wm_class.split(|byte| *byte == 0).nth(1)?;
    if class.is_empty() {
        return None;
    }
    Some(String::from_utf8_lossy(class).into_owned())
}
