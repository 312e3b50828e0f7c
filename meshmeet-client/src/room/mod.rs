mod handle;
mod room;
mod room_command;
mod roster;
mod snapshot;

pub use handle::*;
pub use room::*;
pub use room_command::*;
pub use roster::*;
pub use snapshot::*;
