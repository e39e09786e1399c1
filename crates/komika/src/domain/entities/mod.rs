pub mod history;
pub mod library;
