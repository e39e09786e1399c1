use komika_lib::prelude::{Catalog, Comic};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to fetch catalog: {0}")]
    RequestError(#[from] reqwest::Error),
}

/// Client of the static json catalog
#[derive(Clone)]
pub struct CatalogClient {
    client: reqwest::Client,
    url: String,
}

impl CatalogClient {
    pub fn new(url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn fetch(&self) -> Result<Vec<Comic>, CatalogError> {
        debug!("fetch catalog from {}", self.url);

        let catalog: Catalog = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        info!("catalog returned {} comics", catalog.comics.len());

        Ok(catalog.comics)
    }
}
