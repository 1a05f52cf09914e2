use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use super::{
    controller::SessionError,
    driver::{Driver, SHARED_READ_TIMEOUT},
};

/// How long an idle worker waits for a new session before checking its stop
/// flag again
const IDLE_WAIT: Duration = Duration::from_millis(100);

/// Runs several controller sessions on one background thread. Each iteration
/// performs one short read per session in turn.
#[derive(Debug)]
pub struct SharedWorker {
    sender: Option<Sender<Driver>>,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl SharedWorker {
    pub fn spawn() -> Result<Self, std::io::Error> {
        let (sender, receiver) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = stop.clone();
        let thread = thread::Builder::new()
            .name("steampad-worker".to_string())
            .spawn(move || run(receiver, thread_stop))?;

        Ok(Self {
            sender: Some(sender),
            stop,
            thread: Some(thread),
        })
    }

    /// Hand a session over to the worker
    pub fn add(&self, driver: Driver) -> Result<(), SessionError> {
        let Some(sender) = self.sender.as_ref() else {
            return Err(SessionError::WorkerStopped);
        };
        sender
            .send(driver)
            .map_err(|_| SessionError::WorkerStopped)
    }

    /// Stop the worker, tearing down every session it still runs
    pub fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Release);
        self.sender.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("Shared worker panicked");
            }
        }
    }
}

impl Drop for SharedWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn accept(drivers: &mut Vec<Driver>, mut driver: Driver) {
    log::debug!("Shared worker running {}", driver.name());
    driver.init();
    drivers.push(driver);
}

fn run(receiver: Receiver<Driver>, stop: Arc<AtomicBool>) {
    let mut drivers: Vec<Driver> = Vec::new();

    while !stop.load(Ordering::Acquire) {
        if drivers.is_empty() {
            match receiver.recv_timeout(IDLE_WAIT) {
                Ok(driver) => accept(&mut drivers, driver),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        loop {
            match receiver.try_recv() {
                Ok(driver) => accept(&mut drivers, driver),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }

        drivers.retain_mut(|driver| {
            if driver.stop_requested() {
                driver.teardown();
                return false;
            }
            match driver.step(SHARED_READ_TIMEOUT) {
                Ok(_) => true,
                Err(fault) => {
                    log::info!("Removing {} from shared worker: {fault}", driver.name());
                    driver.teardown();
                    false
                }
            }
        });
    }

    for driver in drivers.iter_mut() {
        driver.teardown();
    }
    // Sessions handed over after the last accept were never started
    for mut driver in receiver.try_iter() {
        driver.teardown();
    }
    log::debug!("Shared worker stopped");
}
