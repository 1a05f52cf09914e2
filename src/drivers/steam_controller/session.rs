//! Wired and wireless session lifecycle.
//!
//! A wired controller is connected as soon as its interface is opened. A
//! wireless dongle slot only becomes connected once the controller reports a
//! wireless connect or battery status event.
use packed_struct::PackedStruct;

use crate::config::SessionConfig;

use super::{
    codec::{self, Report},
    hid_report::{
        EventType, PackedCommandReport, PackedWriteRegisterReport, ReportError, ReportType,
        WirelessStatus, WIRELESS_STATUS_OFFSET,
    },
    ProductId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Wireless slot waiting for a controller to pair
    AwaitingConnection,
    Connected,
    Disconnected,
    /// A transport error ended the session for good
    Faulted,
}

/// What the I/O loop must do in response to a session event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    /// Send the setup command sequence
    Setup,
    /// Ask a wireless dongle for the connection status of its slot
    RequestConnectionStatus,
    /// Decode and publish the input report
    Decode,
    /// Zero all inputs, releasing any held buttons
    Zero,
    /// Input report received while not connected, which only holds stale data
    Discard,
    /// Nothing to do
    Ignore,
}

#[derive(Debug, Clone)]
pub struct Session {
    state: SessionState,
    established: bool,
}

impl Session {
    /// Start a new session for the given product and return the action that
    /// opens it.
    pub fn start(product: ProductId) -> (Self, SessionAction) {
        if product.is_wired() {
            let session = Self {
                state: SessionState::Connected,
                established: true,
            };
            (session, SessionAction::Setup)
        } else {
            let session = Self {
                state: SessionState::AwaitingConnection,
                established: false,
            };
            (session, SessionAction::RequestConnectionStatus)
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == SessionState::Connected
    }

    /// Returns true if a connection was established at any point during the
    /// session.
    pub fn was_established(&self) -> bool {
        self.established
    }

    /// Advance the state machine with a full size report
    pub fn on_report(&mut self, report: &Report) -> SessionAction {
        if self.state == SessionState::Faulted {
            return SessionAction::Ignore;
        }
        let Some(event_type) = codec::event_type(report) else {
            log::trace!("Ignoring unknown event type: {}", report[2]);
            return SessionAction::Ignore;
        };

        match event_type {
            EventType::InputData => {
                if self.is_connected() {
                    SessionAction::Decode
                } else {
                    SessionAction::Discard
                }
            }
            EventType::WirelessConnect => {
                let status = WirelessStatus::try_from(report[WIRELESS_STATUS_OFFSET]);
                match status {
                    Ok(WirelessStatus::Connect) if !self.is_connected() => {
                        log::info!("Controller connected");
                        self.connect();
                        SessionAction::Setup
                    }
                    Ok(WirelessStatus::Disconnect) if self.is_connected() => {
                        log::info!("Controller disconnected");
                        self.state = SessionState::Disconnected;
                        SessionAction::Zero
                    }
                    _ => SessionAction::Ignore,
                }
            }
            EventType::BatteryStatus => {
                if self.is_connected() {
                    return SessionAction::Ignore;
                }
                log::info!("Controller connected via battery status");
                self.connect();
                SessionAction::Setup
            }
        }
    }

    /// Mark the session as faulted. A faulted session never recovers.
    pub fn fault(&mut self) {
        self.state = SessionState::Faulted;
    }

    fn connect(&mut self) {
        self.state = SessionState::Connected;
        self.established = true;
    }
}

/// Returns the commands that configure the controller after a connection:
/// clear the lizard mode mappings, then write every mode register at once.
/// Nothing is sent when the configuration is not applied.
pub fn setup_reports(config: &SessionConfig) -> Result<Vec<Report>, ReportError> {
    if !config.apply_configuration {
        return Ok(Vec::new());
    }
    let clear = PackedCommandReport::new(ReportType::ClearMappings).pack()?;
    let registers = PackedWriteRegisterReport::new(
        config.gyro_mode,
        config.left_stick_mode.register_value(),
        config.right_pad_mode.register_value(),
        config.trackball_or_margin(),
    )
    .pack()?;

    Ok(vec![clear, registers])
}

/// Returns the commands that restore the controller's default keyboard and
/// mouse emulation.
pub fn teardown_reports() -> Result<Vec<Report>, ReportError> {
    Ok(vec![
        PackedCommandReport::new(ReportType::DefaultMappings).pack()?,
        PackedCommandReport::new(ReportType::DefaultMouse).pack()?,
    ])
}

pub fn connection_status_report() -> Result<Report, ReportError> {
    Ok(PackedCommandReport::new(ReportType::RequestCommStatus).pack()?)
}
