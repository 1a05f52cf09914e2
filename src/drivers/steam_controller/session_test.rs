use std::error::Error;

use crate::{
    config::{InputMode, SessionConfig},
    drivers::steam_controller::{
        codec::Report,
        hid_report::PACKET_SIZE,
        session::{
            connection_status_report, setup_reports, teardown_reports, Session, SessionAction,
            SessionState,
        },
        ProductId,
    },
};

fn event(tag: u8, status: u8) -> Report {
    let mut report = [0; PACKET_SIZE];
    report[2] = tag;
    report[3] = 1;
    report[4] = status;
    report
}

#[test]
fn test_wired_starts_connected() -> Result<(), Box<dyn Error>> {
    let (mut session, action) = Session::start(ProductId::Wired);
    assert_eq!(action, SessionAction::Setup);
    assert_eq!(session.state(), SessionState::Connected);
    assert!(session.was_established());
    assert_eq!(session.on_report(&event(0x01, 0)), SessionAction::Decode);

    Ok(())
}

#[test]
fn test_wireless_lifecycle() -> Result<(), Box<dyn Error>> {
    let (mut session, action) = Session::start(ProductId::Wireless);
    assert_eq!(action, SessionAction::RequestConnectionStatus);
    assert_eq!(session.state(), SessionState::AwaitingConnection);
    assert!(!session.was_established());

    // Residue input before the handshake is dropped
    assert_eq!(session.on_report(&event(0x01, 0)), SessionAction::Discard);
    // Disconnect while not connected does nothing
    assert_eq!(session.on_report(&event(0x03, 0x01)), SessionAction::Ignore);

    assert_eq!(session.on_report(&event(0x03, 0x02)), SessionAction::Setup);
    assert_eq!(session.state(), SessionState::Connected);
    // A repeated connect does not run setup again
    assert_eq!(session.on_report(&event(0x03, 0x02)), SessionAction::Ignore);
    assert_eq!(session.on_report(&event(0x01, 0)), SessionAction::Decode);

    assert_eq!(session.on_report(&event(0x03, 0x01)), SessionAction::Zero);
    assert_eq!(session.state(), SessionState::Disconnected);
    assert!(session.was_established());
    assert_eq!(session.on_report(&event(0x01, 0)), SessionAction::Discard);

    Ok(())
}

#[test]
fn test_battery_status_connects() -> Result<(), Box<dyn Error>> {
    let (mut session, _) = Session::start(ProductId::Wireless);
    assert_eq!(session.on_report(&event(0x04, 0)), SessionAction::Setup);
    assert!(session.is_connected());
    assert_eq!(session.on_report(&event(0x04, 0)), SessionAction::Ignore);

    Ok(())
}

#[test]
fn test_faulted_session_ignores_reports() -> Result<(), Box<dyn Error>> {
    let (mut session, _) = Session::start(ProductId::Wired);
    session.fault();
    assert_eq!(session.state(), SessionState::Faulted);
    assert_eq!(session.on_report(&event(0x01, 0)), SessionAction::Ignore);
    assert_eq!(session.on_report(&event(0x03, 0x02)), SessionAction::Ignore);

    Ok(())
}

#[test]
fn test_setup_reports() -> Result<(), Box<dyn Error>> {
    let config = SessionConfig {
        right_pad_mode: InputMode::Mouse,
        gyro_mode: 0x0018,
        ..Default::default()
    };
    let reports = setup_reports(&config)?;
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0][0], 0x81);
    assert!(reports[0][1..].iter().all(|b| *b == 0));

    let expected = [
        0x87, 12, 0x30, 0x18, 0x00, 0x07, 0x01, 0x00, 0x08, 0x00, 0x00, 0x18, 0x00, 0x80,
    ];
    assert_eq!(&reports[1][..expected.len()], &expected);
    assert!(reports[1][expected.len()..].iter().all(|b| *b == 0));

    let config = SessionConfig {
        apply_configuration: false,
        ..Default::default()
    };
    assert!(setup_reports(&config)?.is_empty());

    Ok(())
}

#[test]
fn test_teardown_and_status_reports() -> Result<(), Box<dyn Error>> {
    let reports = teardown_reports()?;
    let codes: Vec<u8> = reports.iter().map(|r| r[0]).collect();
    assert_eq!(codes, vec![0x85, 0x8e]);
    assert_eq!(connection_status_report()?[0], 0xb4);

    Ok(())
}
