/// RenderContext - index buffer lifecycle, upload scheduling and bind caching
///
/// The context owns every index buffer created through it (callers hold
/// versioned `IndexBufferId` keys), together with the bind cache and the
/// pending-upload set. Keeping these as context fields instead of
/// process-wide statics gives each context a deterministic lifecycle and
/// lets several independent contexts coexist in one process.
///
/// Control flow: create (or fill-and-create) → write through lock/unlock →
/// bind. On bind, a deferred-path buffer with staged writes is flushed to
/// GPU memory first; then the bind cache is consulted so rebinding the
/// already-bound buffer skips the native call. `upload_buffers` flushes the
/// whole pending set eagerly, once per frame, before a batch of draws.

use std::sync::{Arc, Mutex};

use slotmap::{new_key_type, SlotMap};

use crate::buffer::index_buffer::LockRange;
use crate::buffer::{IndexBuffer, IndexBufferDesc, IndexBufferUsage, IndexFormat, LockMode};
use crate::device::{RenderDevice, UploadPath};
use crate::error::{Error, Result};
use crate::{engine_debug, engine_error, engine_trace, engine_warn};

new_key_type! {
    /// Caller-facing reference to an index buffer owned by a RenderContext.
    /// Keys are versioned: the id of a released buffer goes stale instead of
    /// aliasing a later buffer.
    pub struct IndexBufferId;
}

const SRC: &str = "nova3d::RenderContext";

/// Rendering context owning index buffers and the per-context GPU state
pub struct RenderContext {
    /// Shared device handle (resource creation, mapping, uploads, binds)
    device: Arc<Mutex<dyn RenderDevice>>,
    /// Upload path of the device, fixed at construction
    upload_path: UploadPath,
    /// Buffer table
    buffers: SlotMap<IndexBufferId, IndexBuffer>,
    /// Deferred-path buffers with staged-but-unuploaded writes, in unlock order
    pending_uploads: Vec<IndexBufferId>,
    /// Last buffer bound on the device, used to elide redundant native binds
    bound: Option<IndexBufferId>,
}

impl RenderContext {
    /// Create a context over a device
    pub fn new(device: Arc<Mutex<dyn RenderDevice>>) -> Self {
        let upload_path = device.lock().unwrap().upload_path();
        engine_debug!(SRC, "created render context ({:?} upload path)", upload_path);
        Self {
            device,
            upload_path,
            buffers: SlotMap::with_key(),
            pending_uploads: Vec::new(),
            bound: None,
        }
    }

    // ===== CONSTRUCTION =====

    /// Create an index buffer
    ///
    /// Allocates backend storage of `index_count × format width` bytes. On
    /// the deferred upload path a zeroed host staging region of the same
    /// size is allocated and the buffer starts not-yet-uploaded.
    ///
    /// # Errors
    ///
    /// * `InvalidArgument` - `index_count` is zero or the byte size overflows
    /// * `ResourceAllocation` - the backend cannot provide the memory; no
    ///   handle is leaked
    pub fn create_index_buffer(&mut self, desc: IndexBufferDesc) -> Result<IndexBufferId> {
        if desc.index_count == 0 {
            engine_error!(SRC, "create_index_buffer: index_count must be non-zero");
            return Err(Error::InvalidArgument(
                "index buffer must hold at least one index".to_string(),
            ));
        }
        let size_bytes = desc.index_count
            .checked_mul(desc.format.size_bytes())
            .ok_or_else(|| {
                engine_error!(SRC, "create_index_buffer: byte size overflows for {} indices",
                    desc.index_count);
                Error::InvalidArgument(format!(
                    "index buffer byte size overflows for {} indices", desc.index_count
                ))
            })?;

        let handle = self.device.lock().unwrap().create_index_resource(size_bytes)?;

        let staging = match self.upload_path {
            UploadPath::Deferred => Some(vec![0u8; size_bytes as usize]),
            UploadPath::Immediate => None,
        };

        let id = self.buffers.insert(IndexBuffer::new(handle, &desc, size_bytes, staging));
        engine_debug!(SRC, "created index buffer {:?}: {} x {:?}, {:?}, {} bytes",
            handle, desc.index_count, desc.format, desc.usage, size_bytes);
        Ok(id)
    }

    /// Create a static 16-bit index buffer filled with `indices`
    ///
    /// # Errors
    ///
    /// * `InvalidArgument` - `indices` is empty
    /// * `ResourceAllocation` - propagated from the backend
    pub fn create_index_buffer_from_u16(&mut self, indices: &[u16]) -> Result<IndexBufferId> {
        self.create_filled(indices.len(), IndexFormat::U16, bytemuck::cast_slice(indices))
    }

    /// Create a static 32-bit index buffer filled with `indices`
    ///
    /// # Errors
    ///
    /// * `InvalidArgument` - `indices` is empty
    /// * `ResourceAllocation` - propagated from the backend
    pub fn create_index_buffer_from_u32(&mut self, indices: &[u32]) -> Result<IndexBufferId> {
        self.create_filled(indices.len(), IndexFormat::U32, bytemuck::cast_slice(indices))
    }

    /// Shared fill-and-create path: create static buffer, whole-range lock,
    /// verbatim copy, unlock
    fn create_filled(
        &mut self,
        index_count: usize,
        format: IndexFormat,
        data: &[u8],
    ) -> Result<IndexBufferId> {
        if data.is_empty() {
            engine_error!(SRC, "fill-and-create with empty index data");
            return Err(Error::InvalidArgument(
                "fill-and-create requires at least one index".to_string(),
            ));
        }
        let id = self.create_index_buffer(IndexBufferDesc {
            index_count: index_count as u32,
            usage: IndexBufferUsage::Static,
            format,
        })?;
        // The initial fill overwrites the whole freshly created buffer, so
        // WriteOnly carries the same meaning Discard would on a dynamic one.
        let fill = self.with_lock(id, 0, data.len() as u32, LockMode::WriteOnly, |dst| {
            dst.copy_from_slice(data);
        });
        if let Err(err) = fill {
            // Do not leak the half-built buffer
            self.release(id).ok();
            return Err(err);
        }
        Ok(id)
    }

    // ===== LOCK / UNLOCK =====

    /// Lock a byte range for CPU writes
    ///
    /// Immediate path: maps backend memory; the slice is valid until
    /// `unlock`. Deferred path: hands out the staging sub-range; writes stay
    /// invisible to the GPU until the buffer is flushed (by `bind` or
    /// `upload_buffers`).
    ///
    /// # Errors
    ///
    /// * `InvalidResource` - `id` does not name a live buffer
    /// * `LockConflict` - a lock is already open on this buffer
    /// * `InvalidArgument` - zero-size or out-of-range lock
    /// * `InvalidLockMode` - NoOverwrite/Discard on a non-dynamic buffer
    pub fn lock(
        &mut self,
        id: IndexBufferId,
        offset_bytes: u32,
        size_bytes: u32,
        mode: LockMode,
    ) -> Result<&mut [u8]> {
        let handle = {
            let buffer = self.buffers.get(id).ok_or_else(|| {
                engine_error!(SRC, "lock on a released index buffer");
                Error::InvalidResource("lock on a released index buffer".to_string())
            })?;
            if buffer.is_locked() {
                engine_error!(SRC, "lock while a lock is already open on {:?}", buffer.handle);
                return Err(Error::LockConflict(
                    "a lock is already open on this buffer".to_string(),
                ));
            }
            let end = offset_bytes.checked_add(size_bytes)
                .filter(|end| *end <= buffer.size_bytes());
            if size_bytes == 0 || end.is_none() {
                engine_error!(SRC, "lock range {}+{} invalid for {}-byte buffer {:?}",
                    offset_bytes, size_bytes, buffer.size_bytes(), buffer.handle);
                return Err(Error::InvalidArgument(format!(
                    "lock range {}+{} exceeds buffer size {}",
                    offset_bytes, size_bytes, buffer.size_bytes()
                )));
            }
            if mode.requires_dynamic() && buffer.usage() != IndexBufferUsage::Dynamic {
                engine_error!(SRC, "{:?} lock on non-dynamic buffer {:?}", mode, buffer.handle);
                return Err(Error::InvalidLockMode(format!(
                    "{:?} requires dynamic usage", mode
                )));
            }
            buffer.handle
        };

        engine_trace!(SRC, "lock {:?}: {}+{} bytes, {:?}", handle, offset_bytes, size_bytes, mode);

        match self.upload_path {
            UploadPath::Immediate => {
                let ptr = self.device.lock().unwrap()
                    .map_index_resource(handle, offset_bytes, size_bytes, mode)?;
                let buffer = self.buffers.get_mut(id).ok_or_else(|| {
                    Error::InvalidResource("lock on a released index buffer".to_string())
                })?;
                buffer.open_lock = Some(LockRange { offset_bytes, size_bytes });
                // Safety: the device guarantees the mapped pointer covers
                // `size_bytes` bytes and stays valid until unmap. The
                // returned borrow of `self` prevents any other context
                // operation (including unlock) while the slice is alive.
                Ok(unsafe { std::slice::from_raw_parts_mut(ptr, size_bytes as usize) })
            }
            UploadPath::Deferred => {
                let buffer = self.buffers.get_mut(id).ok_or_else(|| {
                    Error::InvalidResource("lock on a released index buffer".to_string())
                })?;
                buffer.open_lock = Some(LockRange { offset_bytes, size_bytes });
                let start = offset_bytes as usize;
                let end = start + size_bytes as usize;
                match buffer.staging.as_mut() {
                    Some(staging) => Ok(&mut staging[start..end]),
                    None => {
                        buffer.open_lock = None;
                        engine_error!(SRC, "deferred buffer {:?} has no staging region", handle);
                        Err(Error::BackendError(
                            "deferred index buffer has no staging region".to_string(),
                        ))
                    }
                }
            }
        }
    }

    /// Close the open lock on a buffer
    ///
    /// Immediate path: commits the mapped range on the device. Deferred
    /// path: marks the buffer dirty and appends it to the pending-upload set
    /// (idempotent). Any unlock marks the whole buffer dirty; partial-range
    /// dirty tracking is deliberately not done.
    ///
    /// # Errors
    ///
    /// * `InvalidResource` - `id` does not name a live buffer
    /// * `NoOpenLock` - no lock is open on this buffer
    pub fn unlock(&mut self, id: IndexBufferId) -> Result<()> {
        let (handle, range) = {
            let buffer = self.buffers.get_mut(id).ok_or_else(|| {
                engine_error!(SRC, "unlock on a released index buffer");
                Error::InvalidResource("unlock on a released index buffer".to_string())
            })?;
            let range = buffer.open_lock.take().ok_or_else(|| {
                engine_error!(SRC, "unlock without a matching lock on {:?}", buffer.handle);
                Error::NoOpenLock("unlock without a matching lock".to_string())
            })?;
            (buffer.handle, range)
        };

        engine_trace!(SRC, "unlock {:?}: {}+{} bytes", handle, range.offset_bytes, range.size_bytes);

        match self.upload_path {
            UploadPath::Immediate => self.device.lock().unwrap().unmap_index_resource(handle),
            UploadPath::Deferred => {
                if let Some(buffer) = self.buffers.get_mut(id) {
                    buffer.uploaded = false;
                }
                if !self.pending_uploads.contains(&id) {
                    self.pending_uploads.push(id);
                }
                Ok(())
            }
        }
    }

    /// Scoped lock: run `f` on the locked range, then unlock
    ///
    /// The unlock runs whether or not the caller's writes are conditional,
    /// so lock/unlock pairing cannot be forgotten on any non-panicking path.
    pub fn with_lock<R>(
        &mut self,
        id: IndexBufferId,
        offset_bytes: u32,
        size_bytes: u32,
        mode: LockMode,
        f: impl FnOnce(&mut [u8]) -> R,
    ) -> Result<R> {
        let data = self.lock(id, offset_bytes, size_bytes, mode)?;
        let out = f(data);
        self.unlock(id)?;
        Ok(out)
    }

    // ===== BIND =====

    /// Make this buffer the source of indices for subsequent draws
    ///
    /// Flushes staged writes first on the deferred path, then consults the
    /// bind cache: if this buffer is already bound, the native bind call is
    /// skipped entirely.
    pub fn bind(&mut self, id: IndexBufferId) -> Result<()> {
        let (handle, format, needs_upload) = {
            let buffer = self.buffers.get(id).ok_or_else(|| {
                engine_error!(SRC, "bind on a released index buffer");
                Error::InvalidResource("bind on a released index buffer".to_string())
            })?;
            let needs_upload = self.upload_path == UploadPath::Deferred && !buffer.uploaded;
            (buffer.handle, buffer.format(), needs_upload)
        };

        if needs_upload {
            self.flush_buffer(id)?;
            self.pending_uploads.retain(|pending| *pending != id);
        }

        if self.bound == Some(id) {
            engine_trace!(SRC, "bind {:?}: already bound, native bind elided", handle);
            return Ok(());
        }

        self.device.lock().unwrap().bind_index_resource(handle, format)?;
        self.bound = Some(id);
        engine_trace!(SRC, "bind {:?} ({:?})", handle, format);
        Ok(())
    }

    /// Forget the currently bound buffer without touching GPU state
    ///
    /// For use when downstream state has been invalidated externally (e.g.
    /// context reset) and the cache can no longer be trusted; the next bind
    /// will issue a native bind again.
    pub fn bind_null(&mut self) {
        self.bound = None;
    }

    // ===== RELEASE =====

    /// Destroy a buffer's backend and staging memory
    ///
    /// Removes the buffer from the pending-upload set and clears the bind
    /// cache if it refers to this buffer. Releasing an already-released id
    /// is a no-op.
    pub fn release(&mut self, id: IndexBufferId) -> Result<()> {
        let buffer = match self.buffers.remove(id) {
            Some(buffer) => buffer,
            None => return Ok(()),
        };
        self.pending_uploads.retain(|pending| *pending != id);
        if self.bound == Some(id) {
            self.bound = None;
        }
        if buffer.open_lock.is_some() && self.upload_path == UploadPath::Immediate {
            engine_warn!(SRC, "releasing {:?} while a lock is open", buffer.handle);
            self.device.lock().unwrap().unmap_index_resource(buffer.handle).ok();
        }
        self.device.lock().unwrap().destroy_index_resource(buffer.handle)?;
        engine_debug!(SRC, "released index buffer {:?}", buffer.handle);
        // Staging memory is freed when `buffer` drops here
        Ok(())
    }

    // ===== UPLOAD SCHEDULER =====

    /// Flush every buffer with staged-but-unuploaded writes to GPU memory
    ///
    /// Intended to run once per frame, before a batch of draws, to amortize
    /// upload overhead. A buffer already flushed lazily by `bind` is skipped;
    /// conversely, a buffer flushed here makes the lazy flush in `bind` a
    /// no-op. Meaningful only on the deferred upload path.
    pub fn upload_buffers(&mut self) -> Result<()> {
        let pending = std::mem::take(&mut self.pending_uploads);
        if !pending.is_empty() {
            engine_trace!(SRC, "flushing {} pending index buffer(s)", pending.len());
        }
        for id in pending {
            self.flush_buffer(id)?;
        }
        Ok(())
    }

    /// Copy a buffer's staging region to GPU memory and mark it uploaded
    ///
    /// No-op if the buffer is already uploaded. Whole-buffer upload: any
    /// unlock marks the entire buffer dirty.
    fn flush_buffer(&mut self, id: IndexBufferId) -> Result<()> {
        let device = Arc::clone(&self.device);
        let buffer = self.buffers.get_mut(id).ok_or_else(|| {
            Error::InvalidResource("flush on a released index buffer".to_string())
        })?;
        if buffer.uploaded {
            return Ok(());
        }
        match buffer.staging.as_ref() {
            Some(staging) => {
                device.lock().unwrap().upload_index_resource(buffer.handle, 0, staging)?;
                buffer.uploaded = true;
                Ok(())
            }
            None => {
                engine_error!(SRC, "flush of buffer {:?} with no staging region", buffer.handle);
                Err(Error::BackendError(
                    "deferred index buffer has no staging region".to_string(),
                ))
            }
        }
    }

    // ===== QUERIES =====

    /// Upload path of the underlying device
    pub fn upload_path(&self) -> UploadPath {
        self.upload_path
    }

    /// Index format of a live buffer
    pub fn index_format(&self, id: IndexBufferId) -> Result<IndexFormat> {
        self.buffer(id).map(|buffer| buffer.format())
    }

    /// Index count of a live buffer
    pub fn index_count(&self, id: IndexBufferId) -> Result<u32> {
        self.buffer(id).map(|buffer| buffer.index_count())
    }

    /// Total byte size of a live buffer
    pub fn size_bytes(&self, id: IndexBufferId) -> Result<u32> {
        self.buffer(id).map(|buffer| buffer.size_bytes())
    }

    /// The buffer the bind cache currently considers bound, if any
    pub fn bound_buffer(&self) -> Option<IndexBufferId> {
        self.bound
    }

    /// Whether a buffer is waiting in the pending-upload set
    pub fn is_pending_upload(&self, id: IndexBufferId) -> bool {
        self.pending_uploads.contains(&id)
    }

    /// Number of pending uploads
    pub fn pending_upload_count(&self) -> usize {
        self.pending_uploads.len()
    }

    /// Number of live buffers owned by this context
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    fn buffer(&self, id: IndexBufferId) -> Result<&IndexBuffer> {
        self.buffers.get(id).ok_or_else(|| {
            Error::InvalidResource("query on a released index buffer".to_string())
        })
    }
}

impl Drop for RenderContext {
    fn drop(&mut self) {
        let ids: Vec<IndexBufferId> = self.buffers.keys().collect();
        for id in ids {
            if let Err(err) = self.release(id) {
                engine_warn!(SRC, "failed to release index buffer during context drop: {}", err);
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
