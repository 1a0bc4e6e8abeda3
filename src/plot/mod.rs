//! Charts: ASCII for the CLI, SVG for the web page, shared series prep.

pub mod ascii;
pub mod series;
pub mod svg;

pub use ascii::*;
pub use series::*;
pub use svg::*;
