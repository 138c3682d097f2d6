use color_eyre::eyre::{eyre, Result};
use retroprobe::config::{self, InputSource};
use retroprobe::monitor::{MonitorHandle, MonitorSettings, SerialPortTransport};
use retroprobe::state::ControllerEvent;
use retroprobe::xinput::{GilrsPoller, XInputReaderHandle, XInputSettings};
use tokio::sync::mpsc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    config::ensure_default_config()?;
    let config = config::load_or_default();
    info!("Loaded configuration: {:?}", config);

    let (event_sender, mut event_receiver) = mpsc::channel(100);

    let stopper: Box<dyn Fn() + Send> = match &config.input {
        InputSource::Serial {
            port,
            protocol,
            printer_mode,
        } => {
            info!("Monitoring {} as {}", port, protocol);
            let transport = Box::new(SerialPortTransport::new(port));
            let settings = MonitorSettings {
                poll_interval_ms: config.monitor_poll_interval_ms,
                printer_mode: *printer_mode,
            };
            let handle = MonitorHandle::spawn(
                transport,
                Some(protocol.decoder()),
                Some(settings),
                event_sender,
            )
            .map_err(|e| eyre!("Failed to start serial monitor: {}", e))?;
            Box::new(move || handle.stop())
        }
        InputSource::XInput { slot } => {
            info!("Polling controller slot {}", slot);
            let poller = Box::new(
                GilrsPoller::new().map_err(|e| eyre!("Failed to start polled reader: {}", e))?,
            );
            let settings = XInputSettings {
                slot: *slot,
                poll_interval_ms: config.xinput_poll_interval_ms,
            };
            let handle = XInputReaderHandle::spawn(poller, Some(settings), None, event_sender);
            Box::new(move || handle.stop())
        }
    };

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, stopping input");
            stopper();
        }
    });

    run_event_loop(&mut event_receiver).await;
    Ok(())
}

async fn run_event_loop(receiver: &mut mpsc::Receiver<ControllerEvent>) {
    while let Some(event) = receiver.recv().await {
        match event {
            ControllerEvent::StateChange(state) => {
                let pressed: Vec<&str> = state
                    .buttons()
                    .iter()
                    .filter_map(|(name, &down)| down.then_some(name.as_str()))
                    .collect();
                let mut axes: Vec<String> = state
                    .analogs()
                    .iter()
                    .map(|(name, axis)| format!("{name}={:.2}", axis.normalized))
                    .collect();
                axes.sort();
                info!("State: buttons {:?} axes {:?}", pressed, axes);
            }
            ControllerEvent::Disconnected => {
                warn!("Input disconnected; exiting");
                break;
            }
        }
    }
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
