//! Consumer side of a controller session.
//!
//! A [SteamController] is created with a [SessionBuilder]. The builder opens
//! the transport on the calling thread, so construction failures are returned
//! directly and no I/O thread is started for them. The controller then reads
//! published input with [SteamController::poll] at whatever rate suits the
//! application.
use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Instant,
};

use hidapi::HidApi;
use thiserror::Error;

use crate::config::SessionConfig;

use super::{
    bridge::{Bridge, Fault, Snapshot},
    component::{ComponentSpec, ComponentTable, Identifier},
    driver::Driver,
    event::{AxisEvent, ButtonEvent, Event},
    gyro_mouse::PointerSink,
    hid_report::Motor,
    transport::{HidTransport, Transport, TransportError},
    worker::SharedWorker,
    ProductId,
};

/// Possible errors of a controller session
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Unable to open device: {0}")]
    Open(#[from] TransportError),
    #[error("Session faulted: {0}")]
    Faulted(#[from] Fault),
    #[error("Unable to start I/O thread: {0}")]
    Thread(#[from] std::io::Error),
    #[error("Shared worker is not running")]
    WorkerStopped,
}

/// One of the two haptic motors, usable as a simple rumble motor
#[derive(Debug, Clone)]
pub struct Rumbler {
    motor: Motor,
    bridge: Arc<Bridge>,
}

impl Rumbler {
    pub fn name(&self) -> &'static str {
        match self.motor {
            Motor::Left => "Left Motor",
            Motor::Right => "Right Motor",
        }
    }

    /// Protocol id of the motor
    pub fn id(&self) -> u8 {
        self.motor as u8
    }

    pub fn motor(&self) -> Motor {
        self.motor
    }

    /// Rumble with the given intensity in [0, 1]. The rumble fades out on its
    /// own within a fraction of a second.
    pub fn rumble(&self, intensity: f32) {
        self.bridge.rumble(self.motor, intensity, Instant::now());
    }
}

/// Builds and starts a controller session
pub struct SessionBuilder {
    product: ProductId,
    name: Option<String>,
    config: SessionConfig,
    sink: Option<Box<dyn PointerSink>>,
}

impl SessionBuilder {
    pub fn new(product: ProductId) -> Self {
        Self {
            product,
            name: None,
            config: SessionConfig::default(),
            sink: None,
        }
    }

    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Name used in log messages and for the I/O thread
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Where gyro mouse movement goes. Without a sink the gyro mouse is off.
    pub fn pointer_sink(mut self, sink: Box<dyn PointerSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Open the hidraw device at the given path and run the session on its
    /// own thread.
    pub fn open(self, api: &HidApi, path: &str) -> Result<SteamController, SessionError> {
        let transport = HidTransport::open(api, path)?;
        self.spawn(Box::new(transport))
    }

    /// Run the session over the given transport on its own thread
    pub fn spawn(self, transport: Box<dyn Transport>) -> Result<SteamController, SessionError> {
        let (mut controller, driver) = self.build(transport);
        let handle = thread::Builder::new()
            .name(controller.name.clone())
            .spawn(move || driver.run())?;
        controller.thread = Some(handle);

        Ok(controller)
    }

    /// Run the session over the given transport on a shared worker thread
    pub fn attach(
        self,
        worker: &SharedWorker,
        transport: Box<dyn Transport>,
    ) -> Result<SteamController, SessionError> {
        let (mut controller, mut driver) = self.build(transport);
        let (done_tx, done_rx) = mpsc::channel();
        driver.set_done_signal(done_tx);
        worker.add(driver)?;
        controller.done = Some(done_rx);

        Ok(controller)
    }

    fn build(self, transport: Box<dyn Transport>) -> (SteamController, Driver) {
        let name = self
            .name
            .unwrap_or_else(|| format!("Steam Controller ({})", self.product));
        let table = Arc::new(ComponentTable::new(&self.config));
        let bridge = Arc::new(Bridge::new(self.config.event_queue_size));
        let stop = Arc::new(AtomicBool::new(false));

        let mut driver = Driver::new(
            name.clone(),
            self.product,
            transport,
            self.config.clone(),
            table.clone(),
            bridge.clone(),
            stop.clone(),
        );
        if let Some(sink) = self.sink {
            driver.set_pointer_sink(sink);
        }

        let rumblers = if self.config.rumblers {
            Motor::ALL
                .iter()
                .map(|motor| Rumbler {
                    motor: *motor,
                    bridge: bridge.clone(),
                })
                .collect()
        } else {
            Vec::new()
        };

        let controller = SteamController {
            name,
            product: self.product,
            config: self.config,
            reported: vec![0.0; table.len()],
            table,
            bridge,
            snapshot: Snapshot::default(),
            pending: VecDeque::new(),
            rumblers,
            stop,
            thread: None,
            done: None,
            closed: false,
        };

        (controller, driver)
    }
}

/// Handle to a running controller session
pub struct SteamController {
    name: String,
    product: ProductId,
    config: SessionConfig,
    table: Arc<ComponentTable>,
    bridge: Arc<Bridge>,
    snapshot: Snapshot,
    pending: VecDeque<usize>,
    /// Value last reported by the event drain for each component
    reported: Vec<f32>,
    rumblers: Vec<Rumbler>,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
    done: Option<Receiver<()>>,
    closed: bool,
}

impl SteamController {
    pub fn builder(product: ProductId) -> SessionBuilder {
        SessionBuilder::new(product)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn product(&self) -> ProductId {
        self.product
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Every button and axis of this controller, in exposure order
    pub fn components(&self) -> &[ComponentSpec] {
        self.table.components()
    }

    pub fn rumblers(&self) -> &[Rumbler] {
        &self.rumblers
    }

    /// Fetch the latest input state and any pending button transitions.
    /// Once the session has faulted every poll returns the fault.
    pub fn poll(&mut self) -> Result<(), SessionError> {
        self.bridge.poll(&mut self.pending, &mut self.snapshot)?;
        Ok(())
    }

    /// When the polled input state was received from the controller
    pub fn last_update(&self) -> Option<Instant> {
        self.snapshot.updated_at
    }

    /// Value of the given component as of the last poll
    pub fn value(&self, id: Identifier) -> Option<f32> {
        let index = self.table.position(id)?;
        Some(self.table.value(index, &self.snapshot.buffers))
    }

    /// Return the next event since the last call. Button transitions come
    /// first, in the order they happened; each one flips the reported state
    /// of its button. Then every axis whose value changed is reported once.
    pub fn next_event(&mut self) -> Option<Event> {
        let timestamp = self.snapshot.updated_at;

        while let Some(index) = self.pending.pop_front() {
            let Some(component) = self.table.get(index) else {
                continue;
            };
            let Identifier::Button(button) = component.id else {
                continue;
            };
            let pressed = self.reported[index] == 0.0;
            self.reported[index] = if pressed { 1.0 } else { 0.0 };
            return Some(Event::Button(ButtonEvent {
                button,
                pressed,
                timestamp,
            }));
        }

        for (index, component) in self.table.components().iter().enumerate() {
            let Identifier::Axis(axis) = component.id else {
                continue;
            };
            let value = self.table.value(index, &self.snapshot.buffers);
            if value != self.reported[index] {
                self.reported[index] = value;
                return Some(Event::Axis(AxisEvent {
                    axis,
                    value,
                    timestamp,
                }));
            }
        }

        None
    }

    /// Change the capacity of the button transition queue. Transitions not
    /// yet polled are lost.
    pub fn set_event_queue_size(&mut self, size: usize) {
        self.bridge.resize_queue(size);
    }

    /// Stop the session and wait until the controller has been reset and
    /// released.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.stop.store(true, Ordering::Release);

        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                log::error!("I/O thread of {} panicked", self.name);
            }
        }
        if let Some(done) = self.done.take() {
            // An error means the worker is gone, which also ends the session
            let _ = done.recv();
        }
        log::debug!("Closed {}", self.name);
    }
}

impl Drop for SteamController {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for SteamController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SteamController")
            .field("name", &self.name)
            .field("product", &self.product)
            .finish()
    }
}
