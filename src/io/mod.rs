//! Input helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - model artifact loading (`model_file`)
//! - process-lifetime caching of both (`memo`)

pub mod ingest;
pub mod memo;
pub mod model_file;

pub use ingest::*;
pub use memo::*;
pub use model_file::*;
