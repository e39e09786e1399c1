pub mod catalog;
pub use catalog::*;

pub mod chapter;
pub use chapter::*;

pub mod comic;
pub use comic::*;

pub mod status;
pub use status::*;
