//! Text editing primitives shared by the engine and the fallback surface.
//!
//! Provides a rope-backed text buffer with cursor management and the
//! input vocabulary both surfaces understand.

mod buffer;
mod input;

pub use buffer::{Cursor, Direction, EditorBuffer};
pub use input::{EditInput, ToolbarAction};
