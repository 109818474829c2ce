use serde::{Deserialize, Serialize};

/// The compute device a model is bound to.
///
/// Passed to the model at construction time instead of being written into
/// the process environment, so the binding is scoped to one model instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    gpu_id: u32,
}

impl Device {
    pub fn gpu(gpu_id: u32) -> Device {
        Device { gpu_id }
    }

    pub fn gpu_id(&self) -> u32 {
        self.gpu_id
    }

    /// Environment pairs a backend that launches GPU work in a child process
    /// should set to pin it to this device.
    pub fn env_bindings(&self) -> Vec<(&'static str, String)> {
        vec![
            ("CUDA_DEVICE_ORDER", "PCI_BUS_ID".to_string()),
            ("CUDA_VISIBLE_DEVICES", self.gpu_id.to_string()),
        ]
    }
}
