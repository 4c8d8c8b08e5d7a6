//! Concrete backends for flotilla.
//!
//! A backend is reached through a factory object served by
//! [`serve_factory`]. Spawning the factory with an engine address yields an
//! instance object whose containers can be listed, created, attached,
//! started and stopped through the verbs of `flotilla-beam`.
//!
//! Two backends exist: [`BackendKind::Forward`] proxies to a container
//! engine over its HTTP API and [`BackendKind::Debug`] keeps everything in
//! memory.

mod engine;
mod errors;
mod events;
mod forward;
mod kind;
mod memory;
mod objects;

pub use engine::{ContainerDescription, ContainerEngine};
pub use errors::EngineError;
pub use forward::ForwardEngine;
pub use kind::{BackendKind, BackendKindParseError};
pub use memory::MemoryEngine;
pub use objects::{serve_factory, serve_instance};
