/// Mock RenderDevice for unit tests (no GPU required)
///
/// Backs each index resource with a plain `Vec<u8>` and records every call,
/// so tests can assert on native call counts (bind cache elision, upload
/// scheduling) and read device-visible memory back.

#[cfg(test)]
use rustc_hash::FxHashMap;

#[cfg(test)]
use crate::buffer::{IndexFormat, LockMode};
#[cfg(test)]
use crate::device::{IndexResourceHandle, RenderDevice, UploadPath};
#[cfg(test)]
use crate::error::{Error, Result};

/// Mock device that tracks resources and calls without a GPU
#[cfg(test)]
#[derive(Debug)]
pub struct MockRenderDevice {
    path: UploadPath,
    next_handle: u64,
    /// Device-visible memory per live resource
    memory: FxHashMap<IndexResourceHandle, Vec<u8>>,
    /// Currently mapped resource, if any (immediate path)
    mapped: Option<IndexResourceHandle>,
    /// When set, the next create_index_resource fails with ResourceAllocation
    pub fail_next_create: bool,
    /// Call log
    pub create_calls: u32,
    pub destroy_calls: u32,
    pub map_calls: u32,
    pub unmap_calls: u32,
    /// (handle, offset, byte length) per upload
    pub upload_calls: Vec<(IndexResourceHandle, u32, usize)>,
    /// (handle, format) per native bind
    pub bind_calls: Vec<(IndexResourceHandle, IndexFormat)>,
}

#[cfg(test)]
impl MockRenderDevice {
    pub fn new(path: UploadPath) -> Self {
        Self {
            path,
            next_handle: 1,
            memory: FxHashMap::default(),
            mapped: None,
            fail_next_create: false,
            create_calls: 0,
            destroy_calls: 0,
            map_calls: 0,
            unmap_calls: 0,
            upload_calls: Vec::new(),
            bind_calls: Vec::new(),
        }
    }

    pub fn immediate() -> Self {
        Self::new(UploadPath::Immediate)
    }

    pub fn deferred() -> Self {
        Self::new(UploadPath::Deferred)
    }

    /// Number of currently live resources
    pub fn live_resources(&self) -> usize {
        self.memory.len()
    }

    /// Device-visible bytes of a resource
    pub fn resource_contents(&self, handle: IndexResourceHandle) -> Option<&[u8]> {
        self.memory.get(&handle).map(|bytes| bytes.as_slice())
    }
}

#[cfg(test)]
impl RenderDevice for MockRenderDevice {
    fn upload_path(&self) -> UploadPath {
        self.path
    }

    fn create_index_resource(&mut self, size_bytes: u32) -> Result<IndexResourceHandle> {
        if self.fail_next_create {
            self.fail_next_create = false;
            return Err(Error::ResourceAllocation(format!(
                "mock device out of memory (requested {} bytes)", size_bytes
            )));
        }
        let handle = IndexResourceHandle(self.next_handle);
        self.next_handle += 1;
        self.memory.insert(handle, vec![0u8; size_bytes as usize]);
        self.create_calls += 1;
        Ok(handle)
    }

    fn destroy_index_resource(&mut self, handle: IndexResourceHandle) -> Result<()> {
        if self.memory.remove(&handle).is_none() {
            return Err(Error::BackendError(format!(
                "destroy of unknown resource {:?}", handle
            )));
        }
        self.destroy_calls += 1;
        Ok(())
    }

    fn map_index_resource(
        &mut self,
        handle: IndexResourceHandle,
        offset_bytes: u32,
        size_bytes: u32,
        _mode: LockMode,
    ) -> Result<*mut u8> {
        if self.mapped.is_some() {
            return Err(Error::BackendError("a resource is already mapped".to_string()));
        }
        let bytes = self.memory.get_mut(&handle)
            .ok_or_else(|| Error::BackendError(format!("map of unknown resource {:?}", handle)))?;
        let end = offset_bytes as usize + size_bytes as usize;
        if end > bytes.len() {
            return Err(Error::BackendError(format!(
                "map range {}..{} exceeds resource size {}", offset_bytes, end, bytes.len()
            )));
        }
        self.mapped = Some(handle);
        self.map_calls += 1;
        Ok(bytes[offset_bytes as usize..].as_mut_ptr())
    }

    fn unmap_index_resource(&mut self, handle: IndexResourceHandle) -> Result<()> {
        if self.mapped != Some(handle) {
            return Err(Error::BackendError(format!(
                "unmap of resource {:?} which is not mapped", handle
            )));
        }
        self.mapped = None;
        self.unmap_calls += 1;
        Ok(())
    }

    fn upload_index_resource(
        &mut self,
        handle: IndexResourceHandle,
        offset_bytes: u32,
        data: &[u8],
    ) -> Result<()> {
        let bytes = self.memory.get_mut(&handle)
            .ok_or_else(|| Error::BackendError(format!("upload to unknown resource {:?}", handle)))?;
        let start = offset_bytes as usize;
        let end = start + data.len();
        if end > bytes.len() {
            return Err(Error::BackendError(format!(
                "upload range {}..{} exceeds resource size {}", start, end, bytes.len()
            )));
        }
        bytes[start..end].copy_from_slice(data);
        self.upload_calls.push((handle, offset_bytes, data.len()));
        Ok(())
    }

    fn bind_index_resource(&mut self, handle: IndexResourceHandle, format: IndexFormat) -> Result<()> {
        if !self.memory.contains_key(&handle) {
            return Err(Error::BackendError(format!(
                "bind of unknown resource {:?}", handle
            )));
        }
        self.bind_calls.push((handle, format));
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "mock_device_tests.rs"]
mod tests;
