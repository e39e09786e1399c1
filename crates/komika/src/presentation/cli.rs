use anyhow::{Context, anyhow};
use clap::{Subcommand, ValueEnum};
use komika_lib::prelude::{ChapterNumber, ChapterOrder, Comic, ReadingStatus};

use crate::{
    application::{catalog::refresh_catalog, shelf::Shelf},
    domain::entities::library::LibraryStatus,
    infrastructure::{catalog::CatalogClient, config::Config},
};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch the remote catalog into the local cache
    Sync,
    /// Search cached comics by title, author, artist, genre or alternative name
    Search { query: Vec<String> },
    /// Show a cached comic with its chapters
    Show { comic: i64 },
    /// Record the page being read in a chapter
    Read {
        comic: i64,
        chapter: ChapterNumber,
        page: i64,
    },
    /// Print the last read page of a chapter
    Progress { comic: i64, chapter: ChapterNumber },
    Favorite {
        comic: i64,
        #[clap(long)]
        off: bool,
    },
    Follow {
        comic: i64,
        #[clap(long)]
        off: bool,
    },
    /// Set the reading status of a comic
    Status { comic: i64, status: ReadingStatus },
    /// List comics of the library
    Library { list: LibraryList },
    /// List recently read comics, or the read chapters of one comic
    History {
        #[clap(long)]
        comic: Option<i64>,
        #[clap(long)]
        limit: Option<usize>,
    },
    ClearHistory {
        #[clap(long)]
        comic: Option<i64>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LibraryList {
    Favorites,
    Following,
    Planning,
    Reading,
    Completed,
}

pub async fn run(command: Command, config: &Config, shelf: &Shelf) -> Result<(), anyhow::Error> {
    match command {
        Command::Sync => {
            let client = CatalogClient::new(&config.catalog_url);
            let count = refresh_catalog(&client, shelf).await?;
            println!("cached {count} comics");
        }
        Command::Search { query } => {
            let query = query.join(" ");
            for comic in shelf.search_comics(&query).await? {
                print_comic_line(&comic);
            }
        }
        Command::Show { comic } => {
            let comic = find_comic(shelf, comic).await?;
            show_comic(shelf, &comic).await?;
        }
        Command::Read {
            comic,
            chapter: ChapterNumber(number),
            page,
        } => {
            let chapter = shelf
                .get_chapter_by_number(comic, number)
                .await?
                .ok_or_else(|| anyhow!("comic {comic} has no chapter {number}"))?;
            let pages = chapter.page_count() as i64;
            if pages > 0 && page >= pages {
                warn!(
                    "page {page} is past the last page of {}",
                    chapter.display_name()
                );
            }

            let entry = shelf.add_to_history(comic, &chapter.id(), page).await?;
            debug!("history entry: {entry:?}");
            println!("{}: page {}", chapter.display_name(), entry.reading_progress);
        }
        Command::Progress {
            comic,
            chapter: ChapterNumber(number),
        } => {
            let chapter_id = number.to_string();
            let page = shelf.get_chapter_progress(comic, &chapter_id).await?;
            println!("{page}");
        }
        Command::Favorite { comic, off } => {
            let status = shelf.toggle_favorite(comic, !off).await?;
            println!("favorite: {}", status.favorite);
        }
        Command::Follow { comic, off } => {
            let status = shelf.toggle_following(comic, !off).await?;
            println!("following: {}", status.following);
        }
        Command::Status { comic, status } => {
            let status = shelf.set_reading_status(comic, status).await?;
            println!("reading status: {}", status.reading_status);
        }
        Command::Library { list } => {
            let ids = match list {
                LibraryList::Favorites => shelf.get_favorite_comics().await?,
                LibraryList::Following => shelf.get_following_comics().await?,
                LibraryList::Planning => shelf.get_planning_comics().await?,
                LibraryList::Reading => shelf.get_reading_comics().await?,
                LibraryList::Completed => shelf.get_completed_comics().await?,
            };
            print_comic_ids(shelf, &ids).await?;
        }
        Command::History {
            comic: Some(comic),
            ..
        } => {
            for entry in shelf.get_comic_history(comic).await? {
                let read_at = entry
                    .read_at()
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                println!(
                    "chapter {}\tpage {}\t{read_at}",
                    entry.chapter_id, entry.reading_progress
                );
            }
        }
        Command::History { comic: None, limit } => {
            let ids = shelf
                .get_history_comics(limit.unwrap_or(config.history_limit))
                .await?;
            print_comic_ids(shelf, &ids).await?;
        }
        Command::ClearHistory { comic } => {
            let deleted = shelf.clear_history(comic).await?;
            println!("deleted {deleted} entries");
        }
    }

    Ok(())
}

async fn find_comic(shelf: &Shelf, id: i64) -> Result<Comic, anyhow::Error> {
    shelf
        .get_comic(id)
        .await?
        .with_context(|| format!("comic {id} is not cached, run `komika sync` first"))
}

async fn print_comic_ids(shelf: &Shelf, ids: &[i64]) -> Result<(), anyhow::Error> {
    for id in ids {
        match shelf.get_comic(*id).await? {
            Some(comic) => print_comic_line(&comic),
            None => println!("{id}\t(not cached)"),
        }
    }

    Ok(())
}

fn print_comic_line(comic: &Comic) {
    println!("{}\t{}", comic.id, comic.title);
}

async fn show_comic(shelf: &Shelf, comic: &Comic) -> Result<(), anyhow::Error> {
    println!("{} ({})", comic.title, comic.id);
    if !comic.author.is_empty() {
        println!("author: {}", comic.author);
    }
    if let Some(genres) = comic.genres.as_ref().filter(|g| !g.is_empty()) {
        println!("genres: {}", genres.join(", "));
    }
    if !comic.alt_names.is_empty() {
        let names: Vec<&str> = comic.alt_names.iter().map(|alt| alt.name.as_str()).collect();
        println!("also known as: {}", names.join(", "));
    }

    let status = shelf
        .get_library_status(comic.id)
        .await?
        .unwrap_or_else(|| LibraryStatus::new(comic.id));
    println!(
        "favorite: {}, following: {}, reading status: {}",
        status.favorite, status.following, status.reading_status
    );

    let read: Vec<String> = shelf
        .get_comic_history(comic.id)
        .await?
        .into_iter()
        .map(|entry| entry.chapter_id)
        .collect();

    for chapter in comic.sorted_chapters(ChapterOrder::Ascending, None) {
        let marker = if read.contains(&chapter.id()) { "*" } else { " " };
        println!(
            "{marker} {}\t[{}]\t{} pages",
            chapter.display_name(),
            chapter.language,
            chapter.page_count()
        );
    }

    Ok(())
}
