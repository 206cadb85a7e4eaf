use crate::data::SiteDetails;
use std::sync::Arc;

/// Lookup over the configured sites.
///
/// Only authenticated sites are resolvable; a saved query bound to a site
/// without credentials is treated like one whose site was removed.
#[derive(Debug, Clone, Default)]
pub struct SiteManager {
    sites: Arc<Vec<SiteDetails>>,
}

impl SiteManager {
    pub fn new(sites: Vec<SiteDetails>) -> Self {
        Self {
            sites: Arc::new(sites),
        }
    }

    pub fn get_site_for_id(&self, id: &str) -> Option<&SiteDetails> {
        self.authenticated_sites().find(|site| site.id == id)
    }

    pub fn has_authenticated_site(&self) -> bool {
        self.authenticated_sites().next().is_some()
    }

    pub fn authenticated_sites(&self) -> impl Iterator<Item = &SiteDetails> {
        self.sites.iter().filter(|site| site.is_authenticated())
    }

    pub fn first_authenticated(&self) -> Option<&SiteDetails> {
        self.authenticated_sites().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(id: &str, token: &str) -> SiteDetails {
        SiteDetails {
            id: id.to_string(),
            name: id.to_string(),
            base_url: format!("https://{}.example.com", id),
            email: "me@example.com".to_string(),
            api_token: token.to_string(),
            epic_link_field: "customfield_10014".to_string(),
            epic_name_field: "customfield_10011".to_string(),
        }
    }

    #[test]
    fn test_unauthenticated_sites_do_not_resolve() {
        let sites = SiteManager::new(vec![site("a", ""), site("b", "token")]);

        assert!(sites.get_site_for_id("a").is_none());
        assert_eq!(sites.get_site_for_id("b").map(|s| s.id.as_str()), Some("b"));
        assert!(sites.get_site_for_id("missing").is_none());
        assert!(sites.has_authenticated_site());
        assert_eq!(sites.first_authenticated().map(|s| s.id.as_str()), Some("b"));
    }

    #[test]
    fn test_no_sites() {
        let sites = SiteManager::default();
        assert!(!sites.has_authenticated_site());
        assert!(sites.first_authenticated().is_none());
    }
}
