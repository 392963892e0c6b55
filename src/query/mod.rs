pub mod catalog;
pub mod error;
pub mod grammar;
pub mod state;
pub mod tag;
pub mod url;

pub use url::generate;
