/*!
# Nova 3D Engine

Index-buffer resource management core for the Nova 3D rendering engine.

This crate abstracts the allocation, population, locking, binding, and
destruction of GPU-resident index buffers over two mutually exclusive device
upload models (immediate mapping vs. deferred staging uploads), behind one
interface.

## Architecture

- **RenderDevice**: trait for the device/context collaborator owning GPU
  resource creation and draw submission (backends implement it)
- **RenderContext**: owns index buffers, the bind cache and the
  pending-upload set; all buffer operations go through it
- **IndexBuffer**: per-buffer state (handle, format, usage, staging,
  open-lock record), referenced by callers via `IndexBufferId`

The bind cache and the pending-upload set are per-context fields rather
than process-wide statics, so multiple independent contexts can coexist in
one process.
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod buffer;
pub mod device;
pub mod context;

// Main nova3d namespace module
pub mod nova3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton (logger host)
    pub use crate::engine::Engine;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
        // Note: engine_* macros are NOT re-exported here - they are internal only
    }

    // Render sub-module with all rendering types
    pub mod render {
        pub use crate::buffer::*;
        pub use crate::context::*;
        pub use crate::device::*;
    }
}
