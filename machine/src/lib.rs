pub mod dragon;
pub mod host;

pub use dragon::{Dragon32, ExecEvent};
pub use host::{HostIo, MemoryImage, NullHost};
