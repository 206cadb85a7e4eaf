use crate::jira::{SiteManager, HTTP_CLIENT};
use async_trait::async_trait;
use std::time::Duration;

/// Answers whether the network is usable right now.
#[async_trait]
pub trait Connectivity: Send + Sync {
    async fn is_online(&self) -> bool;
}

/// Considers the machine online when the first authenticated site answers
/// at all; any HTTP status counts, only transport errors mean offline.
#[derive(Debug, Clone)]
pub struct SiteProbe {
    sites: SiteManager,
}

impl SiteProbe {
    pub fn new(sites: SiteManager) -> Self {
        Self { sites }
    }
}

#[async_trait]
impl Connectivity for SiteProbe {
    async fn is_online(&self) -> bool {
        let Some(site) = self.sites.first_authenticated() else {
            return false;
        };

        match HTTP_CLIENT
            .head(&site.base_url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!("{} unreachable: {}", site.display_name(), e);
                false
            }
        }
    }
}
