//! Driver for the Valve Steam Controller, wired or through its wireless
//! dongle.
pub mod bridge;
pub mod codec;
pub mod component;
pub mod controller;
pub mod driver;
pub mod event;
pub mod gyro_mouse;
pub mod haptics;
pub mod hid_report;
pub mod normalize;
pub mod session;
pub mod transport;
pub mod worker;

#[cfg(test)]
pub mod component_test;
#[cfg(test)]
pub mod session_test;
#[cfg(test)]
pub mod testing;

use std::fmt::Display;

use hidapi::{DeviceInfo, HidApi};

/// Vendor ID
pub const VID: u16 = 0x28de;

/// Interface number carrying controller reports on a wired controller
pub const WIRED_INTERFACE: i32 = 2;
/// Interface numbers of the four controller slots of a wireless dongle
pub const WIRELESS_INTERFACES: std::ops::RangeInclusive<i32> = 1..=4;

/// Steam Controller product ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductId {
    /// Controller connected with a USB cable
    Wired = 0x1102,
    /// Wireless dongle
    Wireless = 0x1142,
}

impl ProductId {
    pub fn from_u16(pid: u16) -> Option<Self> {
        match pid {
            0x1102 => Some(ProductId::Wired),
            0x1142 => Some(ProductId::Wireless),
            _ => None,
        }
    }

    pub fn to_u16(&self) -> u16 {
        *self as u16
    }

    pub fn is_wired(&self) -> bool {
        *self == ProductId::Wired
    }

    pub fn is_wireless(&self) -> bool {
        *self == ProductId::Wireless
    }

    /// Returns true if the given interface number carries controller reports
    pub fn has_interface(&self, interface: i32) -> bool {
        match self {
            ProductId::Wired => interface == WIRED_INTERFACE,
            ProductId::Wireless => WIRELESS_INTERFACES.contains(&interface),
        }
    }
}

impl Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductId::Wired => write!(f, "Wired"),
            ProductId::Wireless => write!(f, "Wireless"),
        }
    }
}

/// A controller interface found on the system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEntry {
    pub path: String,
    pub product: ProductId,
    pub interface: i32,
    pub serial: Option<String>,
}

impl DeviceEntry {
    /// Name used in log messages, e.g. "Steam Controller (Wireless #2)"
    pub fn name(&self) -> String {
        match self.product {
            ProductId::Wired => "Steam Controller (Wired)".to_string(),
            ProductId::Wireless => format!("Steam Controller (Wireless #{})", self.interface),
        }
    }

    fn from_info(info: &DeviceInfo) -> Option<Self> {
        if info.vendor_id() != VID {
            return None;
        }
        let product = ProductId::from_u16(info.product_id())?;
        let interface = info.interface_number();
        if !product.has_interface(interface) {
            return None;
        }
        Some(Self {
            path: info.path().to_string_lossy().to_string(),
            product,
            interface,
            serial: info.serial_number().map(|s| s.to_string()),
        })
    }
}

/// Returns every controller interface known to the given [HidApi], ordered by
/// product and interface number.
pub fn discover(api: &HidApi) -> Vec<DeviceEntry> {
    let mut entries: Vec<DeviceEntry> = api
        .device_list()
        .filter_map(DeviceEntry::from_info)
        .collect();
    entries.sort_by_key(|e| (e.product.to_u16(), e.interface, e.path.clone()));
    entries.dedup_by(|a, b| a.path == b.path);
    log::debug!("Discovered {} controller interfaces", entries.len());

    entries
}
