pub mod catalog;
pub mod shelf;
