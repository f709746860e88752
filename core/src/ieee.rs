//! Queries the IEEE Registration Authority for MAC prefixes.
//!
//! The download endpoint answers with CSV:
//!
//! ```text
//! Registry,Assignment,Organization Name,Organization Address
//! MA-L,DCA632,Raspberry Pi Trading Ltd,"Maurice Wilkes Building, Cowley Road Cambridge  GB CB4 0DS "
//! MA-L,B827EB,Raspberry Pi Foundation,Mitchell Wood House Caldecote Cambridgeshire US CB23 7NU
//! ```
//!
//! The browser view of the same data is <https://regauth.standards.ieee.org/standards-ra-web/pub/view.html>.

use anyhow::Context;
use async_trait::async_trait;
use descry_common::network::mac::VendorPrefix;
use thiserror::Error;
use tracing::{debug, warn};

use crate::vendors::VendorRegistry;

pub const IEEE_RA_URL: &str =
    "https://services13.ieee.org/RST/standards-ra-web/rest/assignments/download/";

/// Search term matching the Raspberry Pi assignments.
pub const DEFAULT_QUERY: &str = "\"raspberry pi\"";

/// The registry could not be reached or answered with an error. Usually transient.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("IEEE RA query failed: {reason} (may be transient; try again?)")]
pub struct RegistryUnavailable {
    pub reason: String,
}

/// Where assignment CSV comes from.
#[async_trait]
pub trait RegistrySource {
    async fn download(&self, query: &str) -> anyhow::Result<String>;
}

/// [`RegistrySource`] backed by the live IEEE endpoint.
pub struct IeeeRegistry {
    client: reqwest::Client,
    url: String,
}

impl IeeeRegistry {
    pub fn new() -> Self {
        Self::with_url(IEEE_RA_URL)
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

impl Default for IeeeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RegistrySource for IeeeRegistry {
    async fn download(&self, query: &str) -> anyhow::Result<String> {
        debug!("Querying {} for {query}", self.url);
        let response = self
            .client
            .get(&self.url)
            .query(&[("registry", "MAC"), ("text", query)])
            .send()
            .await
            .context("request failed")?
            .error_for_status()?;

        response.text().await.context("failed to read response body")
    }
}

/// Extracts the MA-L assignments from a registry CSV body, sorted and de-duplicated.
///
/// The header row is skipped. Only the second column is read; it precedes the quoted
/// organization fields, so a plain split is enough. MA-M and MA-S rows carry longer
/// assignments than a 3-octet prefix and are ignored.
pub fn parse_assignments(body: &str) -> Vec<VendorPrefix> {
    let mut prefixes: Vec<VendorPrefix> = body
        .lines()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let assignment = line.split(',').nth(1)?.trim().trim_matches('"');
            let prefix = VendorPrefix::from_assignment(assignment);
            if prefix.is_none() {
                debug!("Skipping registry row without a 3-octet assignment: {line}");
            }
            prefix
        })
        .collect();

    prefixes.sort();
    prefixes.dedup();
    prefixes
}

/// Fetches the current prefix set for `query`.
///
/// # Errors
/// Transport and HTTP failures come back as [`RegistryUnavailable`] rather than propagating.
pub async fn refresh(
    source: &dyn RegistrySource,
    query: &str,
) -> Result<Vec<VendorPrefix>, RegistryUnavailable> {
    match source.download(query).await {
        Ok(body) => Ok(parse_assignments(&body)),
        Err(e) => {
            let unavailable = RegistryUnavailable {
                reason: format!("{e:#}"),
            };
            warn!("{unavailable}");
            Err(unavailable)
        }
    }
}

/// Checks whether the registry still agrees with the prefixes `registry` holds for `model`.
///
/// Returns `None` when nothing changed, otherwise the freshly fetched set. `registry` is
/// left untouched.
pub async fn diff_against_known(
    source: &dyn RegistrySource,
    registry: &VendorRegistry,
    model: &str,
    query: &str,
) -> Result<Option<Vec<VendorPrefix>>, RegistryUnavailable> {
    let fetched = refresh(source, query).await?;
    let known = registry.prefixes_for(model);

    Ok((fetched != known).then_some(fetched))
}
