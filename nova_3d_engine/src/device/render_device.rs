/// RenderDevice trait - interface to the device that owns GPU resource
/// creation and draw submission
///
/// The engine consumes the device as an opaque collaborator: it creates and
/// destroys index resources, maps them (immediate upload path), receives
/// staged uploads (deferred upload path) and performs native binds. Backend
/// implementations (GL-style immediate, D3D-style deferred) provide concrete
/// types implementing this trait.

use crate::buffer::{IndexFormat, LockMode};
use crate::error::Result;

/// Opaque native GPU buffer object identifier issued by the device
///
/// Wide enough for both GL-style integer names and pointer-sized native
/// handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexResourceHandle(pub u64);

/// How buffer contents reach GPU memory on this device
///
/// A runtime property of the device rather than a compile-time backend
/// switch, so both paths stay testable in one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPath {
    /// Locks map backend-managed memory directly; unlock commits the range
    Immediate,
    /// Locks write into a host staging region; content reaches the GPU via
    /// explicit uploads before a draw needs it
    Deferred,
}

/// Device/context collaborator trait
///
/// All calls are synchronous and run on the thread owning the rendering
/// context.
pub trait RenderDevice: Send + Sync {
    /// Which upload path this device uses
    fn upload_path(&self) -> UploadPath;

    /// Allocate backend storage for an index resource
    ///
    /// # Errors
    ///
    /// Returns `ResourceAllocation` if the backend cannot provide the
    /// requested memory.
    fn create_index_resource(&mut self, size_bytes: u32) -> Result<IndexResourceHandle>;

    /// Free backend storage
    fn destroy_index_resource(&mut self, handle: IndexResourceHandle) -> Result<()>;

    /// Map a range of the resource for CPU writes (immediate path only)
    ///
    /// The returned pointer is valid until the matching
    /// `unmap_index_resource` call.
    fn map_index_resource(
        &mut self,
        handle: IndexResourceHandle,
        offset_bytes: u32,
        size_bytes: u32,
        mode: LockMode,
    ) -> Result<*mut u8>;

    /// Commit a previously mapped range (immediate path only)
    fn unmap_index_resource(&mut self, handle: IndexResourceHandle) -> Result<()>;

    /// Copy staged bytes into GPU memory at `offset_bytes` (deferred path only)
    fn upload_index_resource(
        &mut self,
        handle: IndexResourceHandle,
        offset_bytes: u32,
        data: &[u8],
    ) -> Result<()>;

    /// Make this resource the source of indices for subsequent draws
    fn bind_index_resource(&mut self, handle: IndexResourceHandle, format: IndexFormat) -> Result<()>;
}
