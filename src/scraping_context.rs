use crate::{config::ScrapingConfig, requests::RequestClient};

pub struct ScrapingContext {
    pub scraping_config: ScrapingConfig,
    pub(crate) request_client: RequestClient,
}

impl ScrapingContext {
    pub fn new(scraping_config: ScrapingConfig) -> anyhow::Result<Self> {
        let request_client = RequestClient::new(&scraping_config)?;
        Ok(ScrapingContext {
            scraping_config,
            request_client,
        })
    }
}
