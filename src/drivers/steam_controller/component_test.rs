use std::error::Error;

use crate::{
    config::{SessionConfig, GYRO_MODE_SEND_RAW_ACCEL, GYRO_MODE_SEND_RAW_GYRO},
    drivers::steam_controller::{
        codec::ContextBuffers,
        component::{AxisId, ButtonId, ComponentKind, ComponentTable, Identifier},
        hid_report::PACKET_SIZE,
    },
};

fn buffers_from(report: [u8; PACKET_SIZE]) -> ContextBuffers {
    let mut buffers = ContextBuffers::default();
    buffers.update(&report);
    buffers
}

#[test]
fn test_default_table_layout() -> Result<(), Box<dyn Error>> {
    let table = ComponentTable::new(&SessionConfig::default());
    // 22 buttons, 3 axis pairs, 2 triggers and the raw gyro
    assert_eq!(table.len(), 22 + 6 + 2 + 3);
    assert_eq!(table.buttons().count(), 22);

    let names: Vec<&str> = table.components().iter().map(|c| c.name()).collect();
    assert_eq!(&names[..8], &["R2", "L2", "R1", "L1", "A", "B", "X", "Y"]);
    assert_eq!(
        &names[22..],
        &[
            "X Axis", "Y Axis", "LPad X", "LPad Y", "RPad X", "RPad Y", "LT", "RT", "Gyro X",
            "Gyro Y", "Gyro Z"
        ]
    );

    Ok(())
}

#[test]
fn test_pairs_reference_each_other() -> Result<(), Box<dyn Error>> {
    let table = ComponentTable::new(&SessionConfig::default());
    for (x, y) in [
        (AxisId::StickX, AxisId::StickY),
        (AxisId::LPadX, AxisId::LPadY),
        (AxisId::RPadX, AxisId::RPadY),
    ] {
        let x = table.position(Identifier::Axis(x)).ok_or("missing x")?;
        let y = table.position(Identifier::Axis(y)).ok_or("missing y")?;
        let Some(ComponentKind::PairedAxis { partner, .. }) = table.get(x).map(|c| c.kind) else {
            return Err("x is not paired".into());
        };
        assert_eq!(partner, y);
        let Some(ComponentKind::PairedAxis { partner, .. }) = table.get(y).map(|c| c.kind) else {
            return Err("y is not paired".into());
        };
        assert_eq!(partner, x);
    }

    Ok(())
}

#[test]
fn test_button_mask() -> Result<(), Box<dyn Error>> {
    let mask = ButtonId::A.mask() | ButtonId::B.mask();
    let visible = SessionConfig {
        button_mask: mask,
        ..Default::default()
    };
    let table = ComponentTable::new(&visible);
    assert_eq!(table.buttons().count(), 22);

    let mut report = [0; PACKET_SIZE];
    report[2] = 0x01;
    report[8] = 0xFF;
    let buffers = buffers_from(report);
    let x = table.position(Identifier::Button(ButtonId::X)).ok_or("missing X")?;
    let a = table.position(Identifier::Button(ButtonId::A)).ok_or("missing A")?;
    assert_eq!(table.value(x, &buffers), 0.0);
    assert_eq!(table.value(a, &buffers), 1.0);

    let hidden = SessionConfig {
        hide_disabled_buttons: true,
        ..visible
    };
    let table = ComponentTable::new(&hidden);
    let buttons: Vec<Identifier> = table
        .buttons()
        .filter_map(|i| table.get(i).map(|c| c.id))
        .collect();
    assert_eq!(
        buttons,
        vec![
            Identifier::Button(ButtonId::A),
            Identifier::Button(ButtonId::B)
        ]
    );

    Ok(())
}

#[test]
fn test_gyro_mode_axes() -> Result<(), Box<dyn Error>> {
    let off = SessionConfig {
        gyro_mode: 0,
        ..Default::default()
    };
    let table = ComponentTable::new(&off);
    assert!(table.position(Identifier::Axis(AxisId::GyroX)).is_none());
    assert!(table.position(Identifier::Axis(AxisId::AccelX)).is_none());

    let both = SessionConfig {
        gyro_mode: GYRO_MODE_SEND_RAW_GYRO | GYRO_MODE_SEND_RAW_ACCEL,
        ..Default::default()
    };
    let table = ComponentTable::new(&both);
    assert_eq!(table.len(), 22 + 6 + 2 + 6);
    let last = table.get(table.len() - 1).ok_or("empty table")?;
    assert_eq!(last.id, Identifier::Axis(AxisId::AccelZ));

    Ok(())
}

#[test]
fn test_left_pad_click_reads_pad_buffer() -> Result<(), Box<dyn Error>> {
    let table = ComponentTable::new(&SessionConfig::default());
    let press = table
        .position(Identifier::Button(ButtonId::LPadPress))
        .ok_or("missing LPad Press")?;

    // Stick report mirrors the stick click into the pad click bit
    let mut report = [0; PACKET_SIZE];
    report[2] = 0x01;
    report[10] = 0x42;
    let buffers = buffers_from(report);
    assert_eq!(table.value(press, &buffers), 0.0);

    // Pad report with the click bit set
    report[10] = 0x0A;
    let buffers = buffers_from(report);
    assert_eq!(table.value(press, &buffers), 1.0);

    Ok(())
}

#[test]
fn test_axis_decoding() -> Result<(), Box<dyn Error>> {
    let config = SessionConfig {
        gyro_mode: GYRO_MODE_SEND_RAW_GYRO | GYRO_MODE_SEND_RAW_ACCEL,
        ..Default::default()
    };
    let table = ComponentTable::new(&config);
    let value = |buffers: &ContextBuffers, axis: AxisId| -> Result<f32, Box<dyn Error>> {
        let index = table.position(Identifier::Axis(axis)).ok_or("missing axis")?;
        Ok(table.value(index, buffers))
    };

    let mut report = [0; PACKET_SIZE];
    report[2] = 0x01;
    report[11] = 0xFF;
    // Raw stick Y at full positive scale
    report[18..20].copy_from_slice(&i16::MAX.to_le_bytes());
    // Gyro Y and accel Z at half scale
    report[36..38].copy_from_slice(&0x4000i16.to_le_bytes());
    report[32..34].copy_from_slice(&0x4000i16.to_le_bytes());
    let buffers = buffers_from(report);

    assert_eq!(value(&buffers, AxisId::LeftTrigger)?, 1.0);
    assert_eq!(value(&buffers, AxisId::RightTrigger)?, 0.0);
    assert_eq!(value(&buffers, AxisId::StickX)?, 0.0);
    assert!((value(&buffers, AxisId::StickY)? + 0.99997).abs() < 1e-4);
    assert_eq!(value(&buffers, AxisId::GyroY)?, -0.5);
    assert_eq!(value(&buffers, AxisId::AccelZ)?, -0.5);

    Ok(())
}

#[test]
fn test_components_are_found_by_identity() -> Result<(), Box<dyn Error>> {
    let config = SessionConfig {
        gyro_mode: GYRO_MODE_SEND_RAW_GYRO | GYRO_MODE_SEND_RAW_ACCEL,
        ..Default::default()
    };
    let table = ComponentTable::new(&config);
    for (index, component) in table.components().iter().enumerate() {
        assert_eq!(table.position(component.id), Some(index));
    }

    Ok(())
}
