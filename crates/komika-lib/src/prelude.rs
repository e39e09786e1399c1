pub use crate::error::Error;
pub use crate::models::{
    AltName, Catalog, Chapter, ChapterNumber, ChapterOrder, Comic, ReadingStatus,
};
