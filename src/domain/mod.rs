pub mod device;
pub mod forecast;
pub mod types;

pub use device::*;
pub use forecast::*;
pub use types::*;
