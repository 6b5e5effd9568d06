use crate::error::{AudioError, AudioResult};
use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Device, Host, HostId};
use tracing::warn;

fn get_host_from_id(host_id: HostId) -> AudioResult<Host> {
    cpal::host_from_id(host_id).map_err(|e| AudioError::Backend(format!("Failed to get audio host: {}", e)))
}

/// Names of the audio hosts compiled into this build.
pub fn get_host_names() -> Vec<String> {
    cpal::available_hosts()
        .into_iter()
        .map(|id| id.name().to_string())
        .collect()
}

/// Picks the host whose name matches `host_name`, falling back to the
/// platform default.
pub fn resolve_host_id(host_name: Option<&str>) -> HostId {
    if let Some(name) = host_name {
        if let Some(id) = cpal::available_hosts().into_iter().find(|id| id.name() == name) {
            return id;
        }
        warn!(host = name, "audio host not available, using default");
    }
    cpal::default_host().id()
}

pub fn get_input_devices(host_id: HostId) -> AudioResult<Vec<(String, Device)>> {
    let host = get_host_from_id(host_id)?;
    let devices = host.input_devices()?;
    let mut result = Vec::new();
    for device in devices {
        if let Ok(name) = device.name() {
            result.push((name, device));
        }
    }
    Ok(result)
}

pub fn find_input_device(host_id: HostId, name: &str) -> AudioResult<Device> {
    get_input_devices(host_id)?
        .into_iter()
        .find(|(device_name, _)| device_name == name)
        .map(|(_, device)| device)
        .ok_or_else(|| AudioError::DeviceNotFound(name.to_string()))
}
