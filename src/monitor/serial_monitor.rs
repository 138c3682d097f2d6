//! Serial monitor: owns the receive buffer and the poll loop.
//!
//! One monitor instance serves one port wired to one decoder. Its
//! lifecycle is a statum machine: `Idle` (created, port closed) and
//! `Monitoring` (port open, polled on a fixed interval). A transport
//! failure or an unplugged device ends the instance: it emits
//! `Disconnected` exactly once and stops itself. Reconnecting is the
//! host's business, via a fresh instance.

use chrono::Local;
use statum::{machine, state};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::framing;
use super::transport::SerialTransport;
use crate::decode::PacketDecoder;
use crate::state::ControllerEvent;

/// Receive-buffer capacity reserved in printer mode; transcripts run to
/// hundreds of kilobytes before the terminator line arrives.
const PRINTER_BUFFER_CAPACITY: usize = 1_000_000;

/// Configuration for one monitor instance.
#[derive(Clone, Debug)]
pub struct MonitorSettings {
    /// Poll period in milliseconds. A tuning parameter, not a
    /// correctness requirement; 1 ms keeps display latency negligible.
    pub poll_interval_ms: u64,

    /// Accumulate a multi-line printer transcript instead of framing
    /// single lines.
    pub printer_mode: bool,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1,
            printer_mode: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Failed to open transport: {0}")]
    TransportError(#[from] super::transport::TransportError),
}

/// What one poll tick did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing to do this tick (no data, no complete frame, or no
    /// decoder registered).
    Idle,
    /// A packet was framed and handed to the decoder.
    Emitted,
    /// The transport is gone; `Disconnected` has been emitted and the
    /// instance must not be polled again.
    Disconnected,
    /// The host dropped the event receiver; polling is pointless.
    ChannelClosed,
}

#[state]
#[derive(Debug, Clone)]
pub enum MonitorState {
    Idle,
    Monitoring,
}

#[machine]
pub struct SerialMonitor<S: MonitorState> {
    transport: Box<dyn SerialTransport>,
    decoder: Option<Box<dyn PacketDecoder>>,
    settings: MonitorSettings,
    event_sender: mpsc::Sender<ControllerEvent>,
    buffer: Vec<u8>,
    been_connected: bool,
}

impl<S: MonitorState> SerialMonitor<S> {
    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }
}

impl SerialMonitor<Idle> {
    /// A monitor that has not yet opened its transport. `decoder` may
    /// be `None`; ticks are then a defined no-op until the host builds
    /// a new monitor with one.
    pub fn create(
        transport: Box<dyn SerialTransport>,
        decoder: Option<Box<dyn PacketDecoder>>,
        settings: Option<MonitorSettings>,
        event_sender: mpsc::Sender<ControllerEvent>,
    ) -> Self {
        let settings = settings.unwrap_or_default();
        debug!("Creating serial monitor with settings: {:?}", settings);
        Self::new(transport, decoder, settings, event_sender, Vec::new(), false)
    }

    /// Open the transport and begin monitoring.
    pub fn start(mut self) -> Result<SerialMonitor<Monitoring>, MonitorError> {
        self.buffer.clear();
        if self.settings.printer_mode {
            self.buffer.reserve(PRINTER_BUFFER_CAPACITY);
        }

        self.transport.open()?;
        info!("Serial monitor started (printer_mode: {})", self.settings.printer_mode);
        Ok(self.transition())
    }
}

impl SerialMonitor<Monitoring> {
    /// One poll tick: latch connection state, detect loss, drain the
    /// transport, frame, decode, emit.
    pub async fn poll_tick(&mut self) -> TickOutcome {
        if self.transport.is_open() {
            self.been_connected = true;
        }

        // A device that was seen once and is now gone was unplugged
        // between ticks.
        if self.been_connected && !self.transport.is_open() {
            return self.disconnect().await;
        }

        if !self.transport.is_open() || self.decoder.is_none() {
            return TickOutcome::Idle;
        }

        let available = match self.transport.bytes_to_read() {
            Ok(count) => count,
            Err(e) => {
                warn!("Transport read failed, treating as disconnect: {}", e);
                return self.disconnect().await;
            }
        };
        if available < 1 {
            return TickOutcome::Idle;
        }

        let mut chunk = vec![0u8; available];
        match self.transport.read(&mut chunk) {
            Ok(count) => self.buffer.extend_from_slice(&chunk[..count]),
            Err(e) => {
                warn!("Transport read failed, treating as disconnect: {}", e);
                return self.disconnect().await;
            }
        }

        let packet = if self.settings.printer_mode {
            match framing::printer_transcript_end(&self.buffer) {
                Some(end) => {
                    let packet = self.buffer[..end].to_vec();
                    self.buffer.drain(..=end);
                    packet
                }
                None => return TickOutcome::Idle,
            }
        } else {
            match framing::latest_frame(&self.buffer) {
                Some(frame) => {
                    let packet = self.buffer[frame.start..frame.end].to_vec();
                    // Everything older than the newest frame is dropped
                    // with it; see the framing module on why.
                    self.buffer.drain(..=frame.end);
                    packet
                }
                None => return TickOutcome::Idle,
            }
        };

        let decoder = self
            .decoder
            .as_mut()
            .expect("decoder presence checked above");
        if let Some(state) = decoder.decode(&packet) {
            if self
                .event_sender
                .send(ControllerEvent::StateChange(state))
                .await
                .is_err()
            {
                warn!("Event receiver dropped, stopping monitor");
                self.transport.close();
                return TickOutcome::ChannelClosed;
            }
        } else {
            debug!("Decoder ignored a {}-byte packet", packet.len());
        }
        TickOutcome::Emitted
    }

    /// Close the transport without emitting anything. Used for
    /// host-initiated stops.
    pub fn stop(&mut self) {
        self.transport.close();
    }

    async fn disconnect(&mut self) -> TickOutcome {
        info!("Serial transport lost, monitor stopping");
        self.transport.close();
        if self
            .event_sender
            .send(ControllerEvent::Disconnected)
            .await
            .is_err()
        {
            warn!("Event receiver dropped before disconnect notification");
        }
        TickOutcome::Disconnected
    }
}

/// Handle for a monitor running as a tokio task.
pub struct MonitorHandle {
    cancel: CancellationToken,
}

impl MonitorHandle {
    /// Open the transport and start polling. The task runs until the
    /// transport is lost, the host drops the receiver, or [`stop`]
    /// (Self::stop) is called.
    pub fn spawn(
        transport: Box<dyn SerialTransport>,
        decoder: Option<Box<dyn PacketDecoder>>,
        settings: Option<MonitorSettings>,
        event_sender: mpsc::Sender<ControllerEvent>,
    ) -> Result<Self, MonitorError> {
        let monitor = SerialMonitor::create(transport, decoder, settings, event_sender);
        let monitoring = monitor.start()?;

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        tokio::spawn(async move {
            run_monitor_loop(monitoring, token).await;
        });

        Ok(Self { cancel })
    }

    /// Stop polling and close the transport. Safe to call repeatedly
    /// or after the task already ended; a manual stop emits no
    /// `Disconnected` notification.
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

async fn run_monitor_loop(mut monitor: SerialMonitor<Monitoring>, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(tokio::time::Duration::from_millis(
        monitor.settings().poll_interval_ms,
    ));
    // Ticks are non-reentrant; a slow tick skips the missed ones
    // rather than running them back to back.
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut packets = 0u64;
    let mut last_stats_time = Local::now();
    let stats_interval = chrono::Duration::seconds(30);

    info!("Entering monitor poll loop");
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Monitor stopped by host");
                monitor.stop();
                break;
            }
            _ = interval.tick() => {
                match monitor.poll_tick().await {
                    TickOutcome::Idle => {}
                    TickOutcome::Emitted => packets += 1,
                    TickOutcome::Disconnected => {
                        info!("Monitor task ending after disconnect");
                        break;
                    }
                    TickOutcome::ChannelClosed => {
                        error!("Monitor task ending, event channel closed");
                        break;
                    }
                }

                let now = Local::now();
                if now - last_stats_time > stats_interval {
                    info!(
                        "Monitor stats: {} packets in last {} seconds",
                        packets,
                        (now - last_stats_time).num_seconds()
                    );
                    packets = 0;
                    last_stats_time = now;
                }
            }
        }
    }
}
