/// Device module - the device/context collaborator owning GPU resources

// Module declarations
pub mod render_device;

// Re-export everything from render_device.rs
pub use render_device::*;

// Mock render device for tests (no GPU required)
#[cfg(test)]
pub mod mock_device;
