#[cfg(feature = "x11")]
mod x11_client;

#[cfg(not(feature = "x11"))]
mod null_client;

use crate::engine::Engine;
use log::{error, info, warn};
use std::io;
use std::thread::{self, JoinHandle};

pub trait Client: Send {
    fn supported(&mut self) -> bool;
    // WM_CLASS of the focused window
    fn current_application(&mut self) -> Option<String>;
    // Blocks until the focus changes, then returns the new WM_CLASS ("" if nothing has focus).
    // Ok(None) means this client will never report a change.
    fn next_application(&mut self) -> anyhow::Result<Option<String>>;
}

pub struct WMClient {
    name: String,
    client: Box<dyn Client>,
    supported: Option<bool>,
    last_application: String,
}

impl WMClient {
    pub fn new(name: &str, client: Box<dyn Client>) -> WMClient {
        WMClient {
            name: name.to_string(),
            client,
            supported: None,
            last_application: String::new(),
        }
    }

    pub fn supported(&mut self) -> bool {
        match self.supported {
            Some(supported) => supported,
            None => {
                let supported = self.client.supported();
                info!("application-client: {} (supported: {})", self.name, supported);
                self.supported = Some(supported);
                supported
            }
        }
    }

    pub fn current_application(&mut self) -> Option<String> {
        let result = self.client.current_application();
        if let Some(application) = &result {
            self.log_application(application);
        }
        result
    }

    pub fn next_application(&mut self) -> anyhow::Result<Option<String>> {
        let result = self.client.next_application()?;
        if let Some(application) = &result {
            self.log_application(application);
        }
        Ok(result)
    }

    fn log_application(&mut self, application: &str) {
        if self.last_application != application {
            self.last_application = application.to_string();
            info!("application: {}", application);
        }
    }
}

// Reports the focused window once, then every change, until the client gives up
pub fn spawn_focus_listener(mut client: WMClient, engine: Engine) -> io::Result<JoinHandle<()>> {
    thread::Builder::new().name("focus-listener".into()).spawn(move || {
        if !client.supported() {
            return;
        }
        if let Some(application) = client.current_application() {
            engine.on_focus_changed(&application);
        }
        loop {
            match client.next_application() {
                Ok(Some(application)) => engine.on_focus_changed(&application),
                Ok(None) => break,
                Err(e) => {
                    error!("Stopped watching window focus: {:?}", e);
                    warn!("Falling back to the default rules");
                    engine.on_focus_changed("");
                    break;
                }
            }
        }
    })
}

#[cfg(feature = "x11")]
pub fn build_client() -> WMClient {
    WMClient::new("X11", Box::new(x11_client::X11Client::new()))
}

#[cfg(not(feature = "x11"))]
pub fn build_client() -> WMClient {
    WMClient::new("none", Box::new(null_client::NullClient))
}
