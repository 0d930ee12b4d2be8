use std::sync::Arc;

use scraper::{Html, Selector};
use url::Url;

use crate::id::SteamId;
use crate::profile::Profile;
use crate::transport::{HttpTransport, Transport};
use crate::{Result, SteamError, STEAM_COMMUNITY_URL};

/// Free-text account search.
///
/// Returns one lazy [`Profile`] per hit, seeded with the display name from
/// the results page, in the order the service returned them. Reading any
/// other field of a hit triggers its full fetch.
pub fn search(query: &str) -> Result<Vec<Profile>> {
    search_with(query, Arc::new(HttpTransport))
}

/// Search over a caller-supplied transport; the hits share it for their
/// deferred fetches.
pub fn search_with(
    query: &str,
    transport: Arc<dyn Transport>,
) -> Result<Vec<Profile>> {
    let url = Url::parse_with_params(
        &format!("{}/actions/Search", STEAM_COMMUNITY_URL),
        &[("T", "Account"), ("K", query)],
    )
    .unwrap();
    log::debug!("searching accounts: {}", url);

    let body = transport
        .fetch(url.as_str())
        .map_err(|e| SteamError::SearchFailed(e.to_string()))?;

    let html = Html::parse_document(&body);
    let item = Selector::parse(".resultItem").unwrap();
    let title = Selector::parse("a.linkTitle").unwrap();

    let mut hits = Vec::new();
    for result in html.select(&item) {
        let link = match result.select(&title).next() {
            Some(link) => link,
            None => continue,
        };
        let target = match link.value().attr("href") {
            Some(href) => href,
            None => continue,
        };
        let name = link.text().collect::<String>().trim().to_string();

        let mut profile =
            Profile::lazy_with(SteamId::resolve(target), transport.clone());
        profile.seed_name(name);
        hits.push(profile);
    }

    log::trace!("{} search hits for {:?}", hits.len(), query);
    Ok(hits)
}
