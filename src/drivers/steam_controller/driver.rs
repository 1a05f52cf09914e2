use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::Sender,
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use packed_struct::PackedStruct;

use crate::config::SessionConfig;

use super::{
    bridge::{Bridge, Fault},
    codec::{self, ContextBuffers, Report},
    component::{AxisId, ComponentTable, Identifier},
    gyro_mouse::{GyroMouse, PointerSink},
    haptics::{blend, HapticModel, HapticPulse},
    hid_report::{Motor, PackedHapticPulseReport, PACKET_SIZE},
    session::{self, Session, SessionAction, SessionState},
    transport::{Transport, TransportError},
    ProductId,
};

/// Interrupt read timeout of a session running on its own thread
pub const READ_TIMEOUT: Duration = Duration::from_millis(33);
/// Interrupt read timeout of a session sharing a worker with other sessions
pub const SHARED_READ_TIMEOUT: Duration = Duration::from_millis(4);
/// Timeout of setup, teardown and status commands
pub const COMMAND_TIMEOUT: Duration = Duration::from_millis(250);
/// Timeout of haptic feedback commands
pub const FEEDBACK_TIMEOUT: Duration = Duration::from_millis(1);
/// Time to wait after a read timeout while no controller is connected
const IDLE_BACKOFF: Duration = Duration::from_millis(150);

/// Outcome of a single read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A report was read and dispatched
    Report,
    /// Nothing arrived before the timeout
    Timeout,
}

/// Performs all USB transfers of one controller session. The driver owns the
/// transport and every piece of decoding state; the consumer only sees what
/// is published through the [Bridge].
pub struct Driver {
    name: String,
    transport: Box<dyn Transport>,
    config: SessionConfig,
    table: Arc<ComponentTable>,
    bridge: Arc<Bridge>,
    session: Session,
    opening: Option<SessionAction>,
    buffers: ContextBuffers,
    button_values: Vec<f32>,
    haptics: HapticModel,
    pad_axes: [Option<(usize, usize)>; 2],
    gyro_axes: Option<(usize, usize)>,
    gyro_mouse: Option<GyroMouse>,
    stop: Arc<AtomicBool>,
    done: Option<Sender<()>>,
    torn_down: bool,
}

impl Driver {
    pub fn new(
        name: String,
        product: ProductId,
        transport: Box<dyn Transport>,
        config: SessionConfig,
        table: Arc<ComponentTable>,
        bridge: Arc<Bridge>,
        stop: Arc<AtomicBool>,
    ) -> Self {
        let (session, opening) = Session::start(product);
        let axis_pair = |x: AxisId, y: AxisId| {
            let x = table.position(Identifier::Axis(x))?;
            let y = table.position(Identifier::Axis(y))?;
            Some((x, y))
        };
        let mut pad_axes = [None; 2];
        pad_axes[Motor::Left.index()] = axis_pair(AxisId::LPadX, AxisId::LPadY);
        pad_axes[Motor::Right.index()] = axis_pair(AxisId::RPadX, AxisId::RPadY);
        let gyro_axes = axis_pair(AxisId::GyroZ, AxisId::GyroX);
        let button_values = vec![0.0; table.len()];

        Self {
            name,
            transport,
            config,
            table,
            bridge,
            session,
            opening: Some(opening),
            buffers: ContextBuffers::default(),
            button_values,
            haptics: HapticModel::new(),
            pad_axes,
            gyro_axes,
            gyro_mouse: None,
            stop,
            done: None,
            torn_down: false,
        }
    }

    /// Forward gyro mouse movement to the given sink, if the configuration
    /// enables the gyro mouse.
    pub fn set_pointer_sink(&mut self, sink: Box<dyn PointerSink>) {
        self.gyro_mouse = GyroMouse::new(&self.config, sink);
    }

    /// Signal the given channel once teardown has completed
    pub fn set_done_signal(&mut self, done: Sender<()>) {
        self.done = Some(done);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_faulted(&self) -> bool {
        self.session.state() == SessionState::Faulted
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    /// Open the session: configure a wired controller or ask a wireless
    /// dongle whether a controller is connected.
    pub fn init(&mut self) {
        match self.opening.take() {
            Some(SessionAction::Setup) => self.setup(),
            Some(SessionAction::RequestConnectionStatus) => self.request_connection_status(),
            _ => (),
        }
    }

    /// Run the I/O loop until a stop is requested or the transport faults,
    /// then tear the session down.
    pub fn run(mut self) {
        log::debug!("Starting I/O loop for {}", self.name);
        self.init();
        while !self.stop_requested() {
            match self.step(READ_TIMEOUT) {
                Ok(Step::Timeout) => {
                    if !self.session.is_connected() {
                        thread::sleep(IDLE_BACKOFF);
                    }
                }
                Ok(Step::Report) => (),
                Err(_) => break,
            }
        }
        self.teardown();
        log::debug!("I/O loop for {} stopped", self.name);
    }

    /// Read and dispatch a single report
    pub fn step(&mut self, timeout: Duration) -> Result<Step, Fault> {
        if self.is_faulted() {
            let fault = self.bridge.fault();
            return Err(fault.unwrap_or_else(|| Fault::new("session faulted")));
        }

        let mut buf = [0; PACKET_SIZE];
        let bytes_read = match self.transport.read_interrupt(&mut buf, timeout) {
            Ok(bytes_read) => bytes_read,
            Err(TransportError::Timeout) => return Ok(Step::Timeout),
            Err(e) => return Err(self.fault(e)),
        };

        if bytes_read != PACKET_SIZE {
            log::info!("Unusual transfer length from {}: {bytes_read}", self.name);
            return Ok(Step::Report);
        }

        let now = Instant::now();
        match self.session.on_report(&buf) {
            SessionAction::Setup => self.setup(),
            SessionAction::Decode => self.process_input(&buf, now),
            SessionAction::Zero => self.zero(now),
            SessionAction::Discard => log::trace!("Discarding stale input report"),
            SessionAction::RequestConnectionStatus | SessionAction::Ignore => (),
        }

        Ok(Step::Report)
    }

    /// Decode an input report, publish it and run the per-report updates
    fn process_input(&mut self, report: &Report, now: Instant) {
        self.buffers.update(report);

        let mut transitions = Vec::new();
        for index in self.table.buttons() {
            let value = self.table.value(index, &self.buffers);
            if value != self.button_values[index] {
                transitions.push(index);
                self.button_values[index] = value;
            }
        }
        self.bridge.publish(&self.buffers, &transitions, now);

        self.update_gyro_mouse();
        self.update_haptics(now);
    }

    fn update_gyro_mouse(&mut self) {
        let Some(mouse) = self.gyro_mouse.as_mut() else {
            return;
        };
        let Some((z, x)) = self.gyro_axes else {
            return;
        };
        let gyro_z = self.table.value(z, &self.buffers);
        let gyro_x = self.table.value(x, &self.buffers);
        let buttons = codec::button_bits(self.buffers.latest());
        mouse.update(gyro_z, gyro_x, buttons);
    }

    /// Send haptic feedback to both pads if the haptic interval has elapsed
    fn update_haptics(&mut self, now: Instant) {
        let Some(elapsed) = self.haptics.due(now) else {
            return;
        };
        let requests = self.bridge.rumble_requests();

        for motor in Motor::ALL {
            let auto_haptics = match motor {
                Motor::Left => self.config.left_pad_auto_haptics(),
                Motor::Right => self.config.right_pad_auto_haptics(),
            };
            if auto_haptics {
                let (x, y) = self.pad_position(motor);
                self.haptics.pad_mut(motor).update(x, y, elapsed);
            } else {
                self.haptics.pad_mut(motor).silence();
            }

            let manual = requests[motor.index()].level_at(now);
            let pulse = blend(self.haptics.pad(motor).pulse(), manual);
            self.send_pulse(motor, pulse);
        }

        self.haptics.mark(now);
    }

    fn pad_position(&self, motor: Motor) -> (f32, f32) {
        let Some((x, y)) = self.pad_axes[motor.index()] else {
            return (0.0, 0.0);
        };
        (
            self.table.value(x, &self.buffers),
            self.table.value(y, &self.buffers),
        )
    }

    fn send_pulse(&mut self, motor: Motor, pulse: HapticPulse) {
        let report =
            PackedHapticPulseReport::new(motor, pulse.intensity, pulse.period, pulse.count);
        let buf = match report.pack() {
            Ok(buf) => buf,
            Err(e) => {
                log::warn!("Unable to pack haptic report: {e:?}");
                return;
            }
        };
        if let Err(e) = self.transport.write_control(&buf, FEEDBACK_TIMEOUT) {
            log::debug!("Failed to send force feedback to {}: {e}", self.name);
        }
    }

    /// Release every held button and zero all inputs
    fn zero(&mut self, now: Instant) {
        let mut transitions = Vec::new();
        for index in self.table.buttons() {
            if self.button_values[index] != 0.0 {
                transitions.push(index);
                self.button_values[index] = 0.0;
            }
        }
        self.buffers.clear();
        self.bridge.publish(&self.buffers, &transitions, now);
        self.haptics.reset(now);
    }

    /// Apply the configuration. Failures are logged and the session carries
    /// on with whatever configuration the controller has.
    fn setup(&mut self) {
        let reports = match session::setup_reports(&self.config) {
            Ok(reports) => reports,
            Err(e) => {
                log::warn!("Unable to build setup reports: {e}");
                return;
            }
        };
        for report in reports {
            if let Err(e) = self.transport.write_control(&report, COMMAND_TIMEOUT) {
                log::warn!("Failed to apply configuration to {}: {e}", self.name);
                return;
            }
        }
        log::debug!("Applied configuration to {}", self.name);
    }

    fn request_connection_status(&mut self) {
        let report = match session::connection_status_report() {
            Ok(report) => report,
            Err(e) => {
                log::warn!("Unable to build connection status report: {e}");
                return;
            }
        };
        if let Err(e) = self.transport.write_control(&report, COMMAND_TIMEOUT) {
            log::warn!("Failed to request connection status of {}: {e}", self.name);
        }
    }

    /// Record a transport failure. The session never recovers from it.
    fn fault(&mut self, error: TransportError) -> Fault {
        log::warn!("{} disconnected irregularly: {error}", self.name);
        self.session.fault();
        let fault = Fault::new(format!("{} disconnected irregularly: {error}", self.name));
        self.bridge.record_fault(fault.clone());
        fault
    }

    /// Restore the controller defaults if a connection was ever made, then
    /// release the transport. Only the first call has any effect.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        if self.session.was_established() {
            match session::teardown_reports() {
                Ok(reports) => {
                    for report in reports {
                        if let Err(e) = self.transport.write_control(&report, COMMAND_TIMEOUT) {
                            log::info!("Failed to reset mappings of {} to default: {e}", self.name);
                            break;
                        }
                    }
                }
                Err(e) => log::warn!("Unable to build teardown reports: {e}"),
            }
        }

        if let Err(e) = self.transport.release() {
            log::info!("Unable to release {}: {e}", self.name);
        }
        log::info!("{} cleaned up", self.name);

        if let Some(done) = self.done.take() {
            // The controller may already be gone
            let _ = done.send(());
        }
    }
}

impl std::fmt::Debug for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("name", &self.name)
            .field("session", &self.session)
            .field("gyro_mouse", &self.gyro_mouse)
            .finish()
    }
}
