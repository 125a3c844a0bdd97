//! GPU auto-detection, resolved once before the pipeline starts.

use std::path::Path;

use pdftrans::Device;

/// Whether a CUDA device looks usable on this machine.
///
/// Checks `CUDA_VISIBLE_DEVICES` first (an empty value or `-1` hides every
/// device), then the NVIDIA device node.
pub fn gpu_available() -> bool {
    match std::env::var("CUDA_VISIBLE_DEVICES") {
        Ok(value) => cuda_devices_visible(&value),
        Err(_) => Path::new("/dev/nvidia0").exists(),
    }
}

fn cuda_devices_visible(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && value != "-1" && value.to_ascii_lowercase() != "nodevfiles"
}

/// Resolve `Auto` against the environment.
pub fn resolve(device: Device) -> Device {
    let resolved = device.resolve(device == Device::Auto && gpu_available());
    log::info!("Engine device: {} (requested {})", resolved.as_str(), device.as_str());
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cuda_devices_visible() {
        assert!(cuda_devices_visible("0"));
        assert!(cuda_devices_visible("0,1"));
        assert!(!cuda_devices_visible(""));
        assert!(!cuda_devices_visible("-1"));
        assert!(!cuda_devices_visible("NoDevFiles"));
    }

    #[test]
    fn test_explicit_device_kept() {
        assert_eq!(resolve(Device::Cpu), Device::Cpu);
        assert_eq!(resolve(Device::Gpu), Device::Gpu);
    }
}
