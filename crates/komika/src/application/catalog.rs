use thiserror::Error;

use crate::{
    application::shelf::Shelf,
    domain::{
        repositories::{
            comic::ComicRepository, history::HistoryRepository, library::LibraryRepository,
        },
        services::comic::ComicError,
    },
    infrastructure::catalog::{CatalogClient, CatalogError},
};

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error(transparent)]
    CatalogError(#[from] CatalogError),
    #[error(transparent)]
    ComicError(#[from] ComicError),
}

/// Fetch the remote catalog and merge it into the local cache, returns the number of comics cached
pub async fn refresh_catalog<C, L, H>(
    client: &CatalogClient,
    shelf: &Shelf<C, L, H>,
) -> Result<usize, RefreshError>
where
    C: ComicRepository,
    L: LibraryRepository,
    H: HistoryRepository,
{
    let comics = client.fetch().await?;
    shelf.cache_comics(&comics).await?;

    info!("cached {} comics from {}", comics.len(), client.url());

    Ok(comics.len())
}
