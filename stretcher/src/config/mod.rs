mod device;

pub use device::{DeviceConfig, MEASUREMENT_COUNT};
