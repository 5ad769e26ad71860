use anyhow::Result;
use voxide::audio::Recorder;

/// Device names from the override env var, or the live CPAL enumeration.
/// `VOXIDE_TEST_DEVICES` holds a comma-separated list so the listing can be
/// exercised without real hardware.
pub(crate) fn detected_devices() -> Vec<String> {
    match std::env::var("VOXIDE_TEST_DEVICES") {
        Ok(raw) => parse_device_list(&raw),
        Err(_) => Recorder::list_devices().unwrap_or_else(|err| {
            eprintln!("Failed to list audio input devices: {err}");
            Vec::new()
        }),
    }
}

fn parse_device_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) fn list_input_devices() -> Result<()> {
    let devices = detected_devices();
    if devices.is_empty() {
        println!("No audio input devices detected.");
    } else {
        println!("Available audio input devices:");
        for name in devices {
            println!("  - {name}");
        }
    }
    Ok(())
}
