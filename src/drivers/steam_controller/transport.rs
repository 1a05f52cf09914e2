use std::{ffi::CString, time::Duration};

use hidapi::{HidApi, HidDevice};
use thiserror::Error;

use super::{codec::Report, hid_report::PACKET_SIZE};

/// Possible errors talking to the controller
#[derive(Error, Debug)]
pub enum TransportError {
    /// No data arrived before the timeout. This is routine and never fatal.
    #[error("transfer timed out")]
    Timeout,
    #[error("HID error: {0}")]
    Hid(#[from] hidapi::HidError),
    #[error("invalid device path: {0}")]
    InvalidPath(#[from] std::ffi::NulError),
    #[error("transport is closed")]
    Closed,
}

/// Transfers used by a controller session. Implementations own the opened
/// device interface.
pub trait Transport: Send {
    /// Read one interrupt report. Returns the number of bytes transferred or
    /// [TransportError::Timeout] if nothing arrived in time.
    fn read_interrupt(&mut self, buf: &mut Report, timeout: Duration)
        -> Result<usize, TransportError>;

    /// Send one command report as a SET_REPORT control request
    fn write_control(&mut self, report: &Report, timeout: Duration) -> Result<(), TransportError>;

    /// Release the interface. No transfers are possible afterwards.
    fn release(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// [Transport] backed by a hidraw device opened through hidapi
pub struct HidTransport {
    device: Option<HidDevice>,
}

impl HidTransport {
    /// Open the HID interface at the given path
    pub fn open(api: &HidApi, path: &str) -> Result<Self, TransportError> {
        let path = CString::new(path)?;
        let device = api.open_path(&path)?;
        device.set_blocking_mode(true)?;
        Ok(Self {
            device: Some(device),
        })
    }

    fn device(&self) -> Result<&HidDevice, TransportError> {
        self.device.as_ref().ok_or(TransportError::Closed)
    }
}

impl Transport for HidTransport {
    fn read_interrupt(
        &mut self,
        buf: &mut Report,
        timeout: Duration,
    ) -> Result<usize, TransportError> {
        let timeout = timeout.as_millis().clamp(1, i32::MAX as u128) as i32;
        let bytes_read = self.device()?.read_timeout(&mut buf[..], timeout)?;
        if bytes_read == 0 {
            return Err(TransportError::Timeout);
        }
        Ok(bytes_read)
    }

    fn write_control(&mut self, report: &Report, _timeout: Duration) -> Result<(), TransportError> {
        // Feature reports are sent with a leading report id. The controller
        // does not use numbered reports, so the id is always 0.
        let mut buf = [0; PACKET_SIZE + 1];
        buf[1..].copy_from_slice(report);
        self.device()?.send_feature_report(&buf)?;
        Ok(())
    }

    fn release(&mut self) -> Result<(), TransportError> {
        self.device.take();
        Ok(())
    }
}
