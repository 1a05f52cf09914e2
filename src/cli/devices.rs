use std::error::Error;

use hidapi::HidApi;
use tabled::settings::{Panel, Style};
use tabled::{Table, Tabled};

use steampad::drivers::steam_controller::discover;

#[derive(Tabled)]
struct DeviceRow {
    name: String,
    product: String,
    interface: i32,
    serial: String,
    path: String,
}

pub fn handle_devices() -> Result<(), Box<dyn Error>> {
    let api = HidApi::new()?;
    let entries = discover(&api);
    let count = entries.len();

    let rows: Vec<DeviceRow> = entries
        .into_iter()
        .map(|entry| DeviceRow {
            name: entry.name(),
            product: format!("{} ({:04x})", entry.product, entry.product.to_u16()),
            interface: entry.interface,
            serial: entry.serial.clone().unwrap_or_default(),
            path: entry.path,
        })
        .collect();

    let mut table = Table::new(rows);
    table
        .with(Style::modern_rounded())
        .with(Panel::header("Steam Controller Interfaces"));
    println!("{table}");
    println!("Found {count} interface(s)");

    Ok(())
}
