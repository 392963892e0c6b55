pub mod dimension;
pub mod error;
#[cfg(feature = "netcdf")]
pub mod netcdf_file;
pub mod reader;
pub mod tabular;
pub mod time;

pub use reader::read;
pub use tabular::assemble;
pub use time::normalize;
