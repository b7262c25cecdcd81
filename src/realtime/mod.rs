pub mod events;
pub mod handler;
pub mod registry;

pub use registry::ConnectionRegistry;
