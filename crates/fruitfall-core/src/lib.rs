pub mod constants;
pub mod fever;
pub mod perf;
pub mod profile;
pub mod quality;
pub mod raster;
pub mod viewport;

pub use constants::*;
pub use fever::*;
pub use perf::*;
pub use profile::*;
pub use quality::*;
pub use raster::*;
pub use viewport::*;
