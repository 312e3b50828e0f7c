mod local_media;
mod media_surface;
mod remote_track;

pub use local_media::*;
pub use media_surface::*;
pub use remote_track::*;
