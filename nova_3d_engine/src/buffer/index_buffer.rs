/// Index buffer types - format, usage, lock modes and per-buffer state
///
/// The IndexBuffer itself is a passive record: it holds the backend resource
/// handle, the immutable shape of the buffer (count, format, usage), the
/// staging region when the device uploads deferredly, and the open-lock
/// record. All operations on it (lock/unlock/bind/release) go through
/// `RenderContext`, which owns the buffer table, the bind cache and the
/// pending-upload set.

use crate::device::IndexResourceHandle;

// ===== INDEX FORMAT =====

/// Index element width
///
/// Fixed at buffer creation; determines the per-index byte width and the
/// GPU type tag passed to the device at bind time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    /// 16-bit indices (max 65535 vertices)
    U16,
    /// 32-bit indices (max ~4 billion vertices)
    U32,
}

impl IndexFormat {
    /// Size of one index in bytes
    pub fn size_bytes(&self) -> u32 {
        match self {
            IndexFormat::U16 => 2,
            IndexFormat::U32 => 4,
        }
    }
}

// ===== USAGE =====

/// Buffer usage policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexBufferUsage {
    /// Filled once, drawn many times
    Static,
    /// Rewritten frequently; enables NoOverwrite/Discard lock modes
    Dynamic,
}

// ===== LOCK MODE =====

/// Lock intent declared by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// No read access needed; valid on any buffer
    WriteOnly,
    /// Caller will not touch indices in flight for in-progress draws.
    /// Dynamic buffers only.
    NoOverwrite,
    /// Backend may hand back a fresh region, invalidating previous contents.
    /// Dynamic buffers only.
    Discard,
}

impl LockMode {
    /// Whether this mode is only valid on buffers with dynamic usage
    pub fn requires_dynamic(&self) -> bool {
        match self {
            LockMode::WriteOnly => false,
            LockMode::NoOverwrite | LockMode::Discard => true,
        }
    }
}

// ===== DESCRIPTOR =====

/// Descriptor for creating an index buffer
#[derive(Debug, Clone)]
pub struct IndexBufferDesc {
    /// Number of indices (must be > 0)
    pub index_count: u32,
    /// Usage policy
    pub usage: IndexBufferUsage,
    /// Index element width
    pub format: IndexFormat,
}

// ===== OPEN LOCK RECORD =====

/// Extent of the currently open lock, recorded at lock time and validated
/// at unlock time
#[derive(Debug, Clone, Copy)]
pub(crate) struct LockRange {
    pub offset_bytes: u32,
    pub size_bytes: u32,
}

// ===== INDEX BUFFER =====

/// GPU-resident index buffer
///
/// Exclusively owns one backend resource handle, created once and destroyed
/// exactly once (by `RenderContext::release` or the context's Drop). Format
/// and index count never change after construction; only release + recreate
/// may resize.
pub struct IndexBuffer {
    pub(crate) handle: IndexResourceHandle,
    index_count: u32,
    format: IndexFormat,
    usage: IndexBufferUsage,
    size_bytes: u32,
    /// Host-side staging region; present only when the device uses the
    /// deferred upload path
    pub(crate) staging: Option<Vec<u8>>,
    /// Whether the staged content has reached GPU memory. Immediate-path
    /// buffers are trivially uploaded; deferred-path buffers start dirty.
    pub(crate) uploaded: bool,
    /// At most one lock may be open per buffer
    pub(crate) open_lock: Option<LockRange>,
}

impl IndexBuffer {
    pub(crate) fn new(
        handle: IndexResourceHandle,
        desc: &IndexBufferDesc,
        size_bytes: u32,
        staging: Option<Vec<u8>>,
    ) -> Self {
        let uploaded = staging.is_none();
        Self {
            handle,
            index_count: desc.index_count,
            format: desc.format,
            usage: desc.usage,
            size_bytes,
            staging,
            uploaded,
            open_lock: None,
        }
    }

    // ===== ACCESSORS =====

    /// Index element width
    pub fn format(&self) -> IndexFormat { self.format }

    /// Number of indices
    pub fn index_count(&self) -> u32 { self.index_count }

    /// Usage policy
    pub fn usage(&self) -> IndexBufferUsage { self.usage }

    /// Total size in bytes (index_count × format width)
    pub fn size_bytes(&self) -> u32 { self.size_bytes }

    /// Whether a lock is currently open on this buffer
    pub fn is_locked(&self) -> bool { self.open_lock.is_some() }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "index_buffer_tests.rs"]
mod tests;
