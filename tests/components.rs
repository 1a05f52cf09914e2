use std::error::Error;

use steampad::config::{SessionConfig, GYRO_MODE_SEND_RAW_ACCEL};
use steampad::drivers::steam_controller::codec::ContextBuffers;
use steampad::drivers::steam_controller::component::{
    AxisId, ButtonId, ComponentTable, Identifier,
};
use steampad::drivers::steam_controller::hid_report::PACKET_SIZE;

#[test]
fn test_button_catalogue() -> Result<(), Box<dyn Error>> {
    let table = ComponentTable::new(&SessionConfig::default());
    for button in ButtonId::ALL {
        let index = table
            .position(Identifier::Button(button))
            .ok_or("missing button")?;
        assert!(table.get(index).ok_or("missing component")?.is_button());
        assert!(button.bit() < 23);
        assert_ne!(button.bit(), 21);
    }

    Ok(())
}

#[test]
fn test_accel_only() -> Result<(), Box<dyn Error>> {
    let config = SessionConfig {
        gyro_mode: GYRO_MODE_SEND_RAW_ACCEL,
        ..Default::default()
    };
    let table = ComponentTable::new(&config);
    assert!(table.position(Identifier::Axis(AxisId::GyroZ)).is_none());
    let accel_x = table
        .position(Identifier::Axis(AxisId::AccelX))
        .ok_or("missing accel")?;

    let mut report = [0u8; PACKET_SIZE];
    report[2] = 0x01;
    report[28..30].copy_from_slice(&(-0x4000i16).to_le_bytes());
    let mut buffers = ContextBuffers::default();
    buffers.update(&report);
    assert_eq!(table.value(accel_x, &buffers), -0.5);

    Ok(())
}

#[test]
fn test_pad_dead_zone() -> Result<(), Box<dyn Error>> {
    let table = ComponentTable::new(&SessionConfig::default());
    let x = table
        .position(Identifier::Axis(AxisId::LPadX))
        .ok_or("missing LPad X")?;

    // Left pad touched just inside the default dead zone
    let mut report = [0u8; PACKET_SIZE];
    report[2] = 0x01;
    report[10] = 0x08;
    report[16..18].copy_from_slice(&0x1000i16.to_le_bytes());
    let mut buffers = ContextBuffers::default();
    buffers.update(&report);
    assert_eq!(table.value(x, &buffers), 0.0);

    // Past the edge zone the value saturates
    report[16..18].copy_from_slice(&0x7000i16.to_le_bytes());
    buffers.update(&report);
    assert_eq!(table.value(x, &buffers), 1.0);

    Ok(())
}
