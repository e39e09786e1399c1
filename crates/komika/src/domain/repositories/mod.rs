pub mod comic;
pub mod history;
pub mod library;
