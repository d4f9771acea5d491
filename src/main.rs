use crate::action_dispatcher::ActionDispatcher;
use crate::args::Args;
use crate::config::load_configs;
use crate::device::{get_input_devices, output_device, InputDevice};
use crate::engine::Engine;
use crate::event_handler::EventHandler;
use crate::rule_table::RuleTable;
use anyhow::{bail, Context};
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use evdev::uinput::VirtualDevice;
use log::info;
use nix::sys::select::{select, FdSet};
use nix::sys::signal::{SigSet, Signal};
use nix::sys::signalfd::{SfdFlags, SignalFd};
use std::collections::HashMap;
use std::io::stdout;
use std::os::unix::io::AsRawFd;
use std::path::PathBuf;
use std::time::{Duration, Instant};

mod action;
mod action_dispatcher;
mod args;
mod client;
mod config;
mod device;
mod engine;
mod event;
mod event_handler;
mod keyboard;
mod rule_table;
mod scope;
#[cfg(test)]
mod tests_combo;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    if let Some(shell) = args.completions {
        generate(shell, &mut Args::command(), "comboremap", &mut stdout());
        return Ok(());
    }

    // Configuration
    let mut config = match load_configs(&args.configs) {
        Ok(config) => config,
        Err(e) => bail!("Failed to load config {:?}: {}", args.configs, e),
    };
    if let Some(millis) = args.hold_threshold_millis {
        config.hold_threshold = Duration::from_millis(millis);
    }
    let table = RuleTable::new(&config).context("Failed to load config")?;
    info!("Loaded the default scope and {} window scope(s)", table.len() - 1);
    let engine = Engine::new(table, config.hold_threshold);

    // Blocked before any thread is spawned, so that only the signalfd sees them
    let mut signal_fd = signal_fd().context("Failed to set up signal handling")?;

    // Devices
    let output_device = output_device().context("Failed to prepare an output device")?;
    let mut input_devices = get_input_devices(&args.device, &args.ignore).context("Failed to prepare input devices")?;

    client::spawn_focus_listener(client::build_client(), engine.clone())
        .context("Failed to start watching window focus")?;

    let mut handler = EventHandler::new(engine);
    let mut dispatcher = ActionDispatcher::new(output_device);
    let result = event_loop(&mut input_devices, &mut signal_fd, &mut handler, &mut dispatcher);

    for input_device in input_devices.values_mut() {
        input_device.ungrab();
    }
    result
}

fn signal_fd() -> anyhow::Result<SignalFd> {
    let mut mask = SigSet::empty();
    mask.add(Signal::SIGINT);
    mask.add(Signal::SIGTERM);
    mask.thread_block()?;
    Ok(SignalFd::with_flags(&mask, SfdFlags::empty())?)
}

fn event_loop(
    input_devices: &mut HashMap<PathBuf, InputDevice>,
    signal_fd: &mut SignalFd,
    handler: &mut EventHandler,
    dispatcher: &mut ActionDispatcher<VirtualDevice>,
) -> anyhow::Result<()> {
    loop {
        let mut read_fds = FdSet::new();
        read_fds.insert(signal_fd.as_raw_fd());
        for input_device in input_devices.values() {
            read_fds.insert(input_device.as_raw_fd());
        }
        select(None, &mut read_fds, None, None, None)?;

        if read_fds.contains(signal_fd.as_raw_fd()) {
            if let Some(signal) = signal_fd.read_signal()? {
                info!("Exiting on signal {}", signal.ssi_signo);
            }
            return Ok(());
        }

        for input_device in input_devices.values_mut() {
            if !read_fds.contains(input_device.as_raw_fd()) {
                continue;
            }
            let events = input_device.fetch_events().context("Failed to read input events")?;
            let now = Instant::now();
            for action in handler.on_events(&events, now) {
                dispatcher
                    .on_action(action)
                    .context("Failed to write to the output device")?;
            }
        }
    }
}
