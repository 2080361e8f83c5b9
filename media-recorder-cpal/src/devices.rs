//! Audio input device enumeration via the cpal host.

use cpal::traits::{DeviceTrait, HostTrait};

use media_recorder_core::models::capabilities::{DeviceKind, MediaDeviceInfo};
use media_recorder_core::models::error::RecorderError;

/// List active input devices on the default host.
///
/// Device names double as IDs; cpal exposes no stabler identifier across
/// platforms.
pub fn list_input_devices() -> Result<Vec<MediaDeviceInfo>, RecorderError> {
    let host = cpal::default_host();
    let default_name = host.default_input_device().and_then(|d| d.name().ok());

    let devices = host
        .input_devices()
        .map_err(|e| RecorderError::Unknown(format!("failed to enumerate input devices: {}", e)))?;

    let mut infos = Vec::new();
    for device in devices {
        let name = match device.name() {
            Ok(name) => name,
            Err(e) => {
                log::warn!("skipping unnamed input device: {}", e);
                continue;
            }
        };
        let is_default = default_name.as_deref() == Some(name.as_str());
        infos.push(MediaDeviceInfo {
            id: name.clone(),
            label: name,
            kind: DeviceKind::AudioInput,
            is_default,
        });
    }
    Ok(infos)
}

/// Resolve an input device by ID (its name), or the default device when
/// `device_id` is None.
pub fn resolve_input_device(device_id: Option<&str>) -> Result<cpal::Device, RecorderError> {
    let host = cpal::default_host();

    match device_id {
        Some(id) => {
            let devices = host.input_devices().map_err(|e| {
                RecorderError::Unknown(format!("failed to enumerate input devices: {}", e))
            })?;
            for device in devices {
                if device.name().map(|n| n == id).unwrap_or(false) {
                    return Ok(device);
                }
            }
            Err(RecorderError::DeviceNotAvailable)
        }
        None => host
            .default_input_device()
            .ok_or(RecorderError::DeviceNotAvailable),
    }
}
