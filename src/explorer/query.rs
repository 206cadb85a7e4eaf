use crate::data::{Issue, SiteDetails};
use crate::jira::{search_fields, JiraClient};
use anyhow::Result;

/// Issues requested per search call.
pub const PAGE_SIZE: usize = 100;

/// Run a JQL query against a site, following pages when asked to.
///
/// The offset advances by the number of issues actually received, so a
/// server capping page size below [`PAGE_SIZE`] is neither skipped over nor
/// re-read. Every returned issue has its embedded subtasks cleared.
///
/// Errors from the client propagate unchanged; there is no retry here.
pub async fn fetch_all(
    client: &dyn JiraClient,
    site: &SiteDetails,
    jql: &str,
    fetch_all_pages: bool,
) -> Result<Vec<Issue>> {
    let fields = search_fields(site);
    let mut issues = Vec::new();
    let mut start_at = 0;

    loop {
        let page = client
            .search(site, jql, &fields, PAGE_SIZE, start_at)
            .await?;
        let received = page.issues.len();
        issues.extend(page.issues);
        start_at += received;

        if !fetch_all_pages || start_at >= page.total {
            break;
        }
        if received == 0 {
            tracing::warn!(
                "Search on {} stopped at {} of {} issues: server returned an empty page",
                site.display_name(),
                start_at,
                page.total
            );
            break;
        }
    }

    for issue in &mut issues {
        issue.subtasks.clear();
    }

    Ok(issues)
}
