use std::fmt;

use komika_lib::prelude::ReadingStatus;

/// Boolean library flags a user can toggle on a comic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LibraryFlag {
    Favorite,
    Following,
}

impl LibraryFlag {
    pub fn column(&self) -> &'static str {
        match self {
            LibraryFlag::Favorite => "favorite",
            LibraryFlag::Following => "following",
        }
    }
}

impl fmt::Display for LibraryFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Per-comic user state, created lazily on first write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryStatus {
    pub comic_id: i64,
    pub favorite: bool,
    pub following: bool,
    pub reading_status: ReadingStatus,
}

impl LibraryStatus {
    pub fn new(comic_id: i64) -> Self {
        Self {
            comic_id,
            favorite: false,
            following: false,
            reading_status: ReadingStatus::None,
        }
    }

    pub fn set_flag(&mut self, flag: LibraryFlag, value: bool) {
        match flag {
            LibraryFlag::Favorite => self.favorite = value,
            LibraryFlag::Following => self.following = value,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_set_flag_only_touches_named_field() {
        let mut status = LibraryStatus::new(1);
        status.reading_status = ReadingStatus::Reading;

        status.set_flag(LibraryFlag::Following, true);

        assert!(status.following);
        assert!(!status.favorite);
        assert_eq!(status.reading_status, ReadingStatus::Reading);
    }
}
