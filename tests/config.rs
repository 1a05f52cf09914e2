use std::collections::HashMap;
use std::error::Error;
use std::io::Write;

use steampad::config::{InputMode, SessionConfig, ALL_BUTTONS_MASK};

#[test]
fn test_load_yaml_file() -> Result<(), Box<dyn Error>> {
    let path = std::env::temp_dir().join(format!("steampad-config-{}.yaml", std::process::id()));
    let mut file = std::fs::File::create(&path)?;
    writeln!(file, "right_pad_mode: mouse")?;
    writeln!(file, "gyro_mode: 24")?;
    writeln!(file, "gyro_mouse_x: 0.5")?;
    drop(file);

    let config = SessionConfig::from_yaml_file(&path);
    std::fs::remove_file(&path)?;
    let config = config?;

    assert_eq!(config.right_pad_mode, InputMode::Mouse);
    assert_eq!(config.gyro_mode, 0x18);
    assert!(config.sends_raw_accel());
    assert_eq!(config.trackball_or_margin(), 0x8000);
    assert!(!config.right_pad_auto_haptics());
    assert_eq!(config.button_mask, ALL_BUTTONS_MASK);
    assert!(config.gyro_mouse_enabled());

    Ok(())
}

#[test]
fn test_missing_file() -> Result<(), Box<dyn Error>> {
    let result = SessionConfig::from_yaml_file("/nonexistent/steampad/config.yaml");
    assert!(result.is_err());

    Ok(())
}

#[test]
fn test_properties_match_yaml() -> Result<(), Box<dyn Error>> {
    let properties: HashMap<String, String> = [
        ("left_stick_mode", "0"),
        ("button_mask", "0b11"),
        ("left_pad_dead_zone", "0.1"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    let from_properties = SessionConfig::from_properties(&properties);

    let from_yaml = SessionConfig::from_yaml(
        "left_stick_mode: mouse\nbutton_mask: 3\nleft_pad_dead_zone: 0.1\n".to_string(),
    )?;
    assert_eq!(from_properties, from_yaml);

    Ok(())
}
