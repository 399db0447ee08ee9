//! Device and dtype selection, resolved once at startup.

use aibou_core::error::{AibouError, Result};
use candle_core::{DType, Device};

/// Pick CUDA when available, otherwise CPU. There is no runtime
/// override; the choice is made once per process.
pub fn auto_device() -> Result<Device> {
    Device::cuda_if_available(0).map_err(|e| AibouError::Candle(e.to_string()))
}

/// Printable device name for status messages.
pub fn device_name(device: &Device) -> &'static str {
    if device.is_cuda() { "cuda" } else { "cpu" }
}

/// bf16 on CUDA when mixed precision is requested, f32 otherwise.
pub fn select_dtype(device: &Device, mixed_precision: bool) -> DType {
    if mixed_precision && device.is_cuda() {
        DType::BF16
    } else {
        DType::F32
    }
}
