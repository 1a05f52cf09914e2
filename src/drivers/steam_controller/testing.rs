//! In-memory transport that replays scripted reads and records every write.
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard},
    thread,
    time::{Duration, Instant},
};

use super::{
    codec::Report,
    hid_report::PACKET_SIZE,
    transport::{Transport, TransportError},
};

const WAIT_STEP: Duration = Duration::from_millis(1);

#[derive(Debug)]
enum Read {
    Report(Report),
    Short(usize),
    Error(String),
}

#[derive(Debug, Default)]
struct State {
    script: VecDeque<Read>,
    writes: Vec<Report>,
    idle_reads: usize,
    released: bool,
}

/// Test side of a [ScriptedTransport]
#[derive(Debug, Clone, Default)]
pub struct ScriptHandle {
    state: Arc<Mutex<State>>,
}

impl ScriptHandle {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn push_report(&self, report: Report) {
        let mut state = self.lock();
        state.script.push_back(Read::Report(report));
        state.idle_reads = 0;
    }

    pub fn push_short(&self, length: usize) {
        let mut state = self.lock();
        state.script.push_back(Read::Short(length));
        state.idle_reads = 0;
    }

    pub fn push_error(&self, message: &str) {
        let mut state = self.lock();
        state.script.push_back(Read::Error(message.to_string()));
        state.idle_reads = 0;
    }

    /// Every report written so far
    pub fn writes(&self) -> Vec<Report> {
        self.lock().writes.clone()
    }

    /// Command codes of every written report except haptic pulses
    pub fn commands(&self) -> Vec<u8> {
        self.lock()
            .writes
            .iter()
            .map(|report| report[0])
            .filter(|code| *code != 0x8f)
            .collect()
    }

    pub fn released(&self) -> bool {
        self.lock().released
    }

    /// Wait until every scripted read was consumed and the reader came back
    /// for more, which means the last report was fully processed.
    pub fn wait_drained(&self, timeout: Duration) -> bool {
        self.wait_for(timeout, |state| {
            state.script.is_empty() && state.idle_reads > 0
        })
    }

    /// Wait until the transport was released
    pub fn wait_released(&self, timeout: Duration) -> bool {
        self.wait_for(timeout, |state| state.released)
    }

    fn wait_for<F: Fn(&State) -> bool>(&self, timeout: Duration, condition: F) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if condition(&self.lock()) {
                return true;
            }
            thread::sleep(WAIT_STEP);
        }
        false
    }
}

/// [Transport] driven by a [ScriptHandle]
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    handle: ScriptHandle,
}

impl ScriptedTransport {
    pub fn new() -> (Self, ScriptHandle) {
        let handle = ScriptHandle::default();
        let transport = Self {
            handle: handle.clone(),
        };
        (transport, handle)
    }
}

impl Transport for ScriptedTransport {
    fn read_interrupt(
        &mut self,
        buf: &mut Report,
        timeout: Duration,
    ) -> Result<usize, TransportError> {
        let next = {
            let mut state = self.handle.lock();
            if state.released {
                return Err(TransportError::Closed);
            }
            let next = state.script.pop_front();
            if next.is_none() {
                state.idle_reads += 1;
            }
            next
        };

        match next {
            Some(Read::Report(report)) => {
                buf.copy_from_slice(&report);
                Ok(PACKET_SIZE)
            }
            Some(Read::Short(length)) => Ok(length),
            Some(Read::Error(message)) => {
                Err(TransportError::Hid(hidapi::HidError::HidApiError { message }))
            }
            None => {
                thread::sleep(timeout.min(WAIT_STEP));
                Err(TransportError::Timeout)
            }
        }
    }

    fn write_control(&mut self, report: &Report, _timeout: Duration) -> Result<(), TransportError> {
        let mut state = self.handle.lock();
        if state.released {
            return Err(TransportError::Closed);
        }
        state.writes.push(*report);
        Ok(())
    }

    fn release(&mut self) -> Result<(), TransportError> {
        self.handle.lock().released = true;
        Ok(())
    }
}

/// Build an input data report with the given button bits held
pub fn input_report(buttons: u32) -> Report {
    let mut report = [0; PACKET_SIZE];
    report[2] = 0x01;
    report[3] = 0x3c;
    report[8..12].copy_from_slice(&buttons.to_le_bytes());
    report
}

/// Build a wireless connect (0x02) or disconnect (0x01) event
pub fn wireless_report(status: u8) -> Report {
    let mut report = [0; PACKET_SIZE];
    report[2] = 0x03;
    report[3] = 0x01;
    report[4] = status;
    report
}
