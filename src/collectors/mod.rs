pub mod asn_names;
pub mod ip_lookup;
pub mod ris;
pub mod table;

pub use asn_names::AsnNameCollector;
pub use ip_lookup::{IpAsnInfo, IpLookup};
pub use ris::RisPathCollector;
pub use table::PrefixTableCollector;

use std::time::Duration;

use reqwest::blocking::{Client, Response};

use crate::config::HttpConfig;
use crate::shared::{Error, Result};

fn build_client(http: &HttpConfig, timeout: Duration) -> Result<Client> {
    let client = Client::builder()
        .user_agent(http.user_agent.clone())
        .timeout(timeout)
        .build()?;
    Ok(client)
}

/// GET `url`, turning any non-success status into an error
fn get_checked(client: &Client, url: &str) -> Result<Response> {
    let response = client.get(url).send()?;
    if !response.status().is_success() {
        return Err(Error::HttpStatus {
            url: url.to_string(),
            status: response.status(),
        });
    }
    Ok(response)
}
