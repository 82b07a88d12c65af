//! Host-side collaborators: the document resources are injected into and the
//! text surface an engine binds to.

mod document;
mod surface;

pub use document::{HostDocument, MemoryDocument, ResourceKind, ResourceRef};
pub use surface::{HostSurface, SurfaceError, SurfaceMode};
