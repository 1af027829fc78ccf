/// Buffer module - index buffer types and state

// Module declarations
pub mod index_buffer;

// Re-export everything from index_buffer.rs
pub use index_buffer::*;
