pub mod codec;
pub mod cover;
pub mod curve;
pub mod pool;
pub mod position;
pub mod registry;
pub mod ticks;

pub use codec::*;
pub use cover::*;
pub use curve::*;
pub use pool::*;
pub use position::*;
pub use registry::*;
pub use ticks::*;
