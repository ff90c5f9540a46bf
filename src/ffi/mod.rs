//! The foreign-function boundary: fixed C layouts, the memory-owning
//! marshalling units that produce them, and the native core's entry-point
//! table.

pub mod layout;
pub mod marshal;
pub mod native;

pub use marshal::{
    BatchBuffer, BatchOptionsBuffer, CommandBuffer, ConfigBuffer, RouteBuffer, ScriptArgsBuffer,
};
pub use native::NativeApi;
