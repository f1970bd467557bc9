use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use super::{build_client, get_checked};
use crate::config::HttpConfig;
use crate::shared::{Result, ASN};

/// Origin of the prefix covering an address
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IpAsnInfo {
    pub source: String,
    pub asn: ASN,
    pub asn_name: Option<String>,
    pub prefix: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BgpToolsIp {
    asn: Option<ASN>,
    asn_name: Option<String>,
    prefix: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RipeOverview {
    #[serde(default)]
    data: RipeOverviewData,
}

#[derive(Debug, Default, Deserialize)]
struct RipeOverviewData {
    #[serde(default)]
    asns: Vec<RipeAsn>,
    prefix: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RipeAsn {
    asn: ASN,
    holder: Option<String>,
}

fn parse_bgptools(body: &str) -> Result<Option<IpAsnInfo>> {
    let record: BgpToolsIp = serde_json::from_str(body)?;
    Ok(record.asn.map(|asn| IpAsnInfo {
        source: "bgp.tools".to_string(),
        asn,
        asn_name: record.asn_name,
        prefix: record.prefix,
    }))
}

fn parse_ripe(body: &str) -> Result<Option<IpAsnInfo>> {
    let overview: RipeOverview = serde_json::from_str(body)?;
    let RipeOverviewData { asns, prefix } = overview.data;
    Ok(asns.into_iter().next().map(|first| IpAsnInfo {
        source: "ripe".to_string(),
        asn: first.asn,
        asn_name: first.holder,
        prefix,
    }))
}

/// IP to origin ASN lookups: bgp.tools first, RIPEstat as the fallback
pub struct IpLookup {
    http: HttpConfig,
}

impl IpLookup {
    pub fn new(http: HttpConfig) -> Self {
        IpLookup { http }
    }

    /// `None` when neither source knows an origin for `ip`
    pub fn lookup(&self, ip: IpAddr) -> Result<Option<IpAsnInfo>> {
        let client = build_client(&self.http, self.http.timeout())?;

        let url = format!("{}{}", self.http.ip_api_url, ip);
        let response = client.get(&url).send()?;
        if response.status().is_success() {
            if let Some(info) = parse_bgptools(&response.text()?)? {
                return Ok(Some(info));
            }
        } else {
            log::info!("bgp.tools answered {} for {}, trying RIPEstat", response.status(), ip);
        }

        let url = format!("{}prefix-overview/data.json?resource={}", self.http.ripestat_url, ip);
        let response = get_checked(&client, &url)?;
        parse_ripe(&response.text()?)
    }
}
