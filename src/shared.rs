use std::fmt;

pub type ASN = u32;

/// Canonical short name of a network, as produced by the label normalizer
pub type Label = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

impl AddressFamily {
    pub fn from_ipv6_flag(ipv6: bool) -> Self {
        if ipv6 {
            AddressFamily::Ipv6
        } else {
            AddressFamily::Ipv4
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AddressFamily::Ipv4 => "IPV4",
            AddressFamily::Ipv6 => "IPV6",
        };
        write!(f, "{}", s)
    }
}

/// Where the AS paths of an analysis come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PathSource {
    RouteServer,
    Ris,
}

impl fmt::Display for PathSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PathSource::RouteServer => "ROUTE_SERVER",
            PathSource::Ris => "RIS",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommonASNs;

impl CommonASNs {
    pub const CHINA_MOBILE: ASN = 56040;
    pub const CMI: ASN = 58453;
    pub const TELIA: ASN = 1299;
    pub const LUMEN: ASN = 3356;
    pub const COGENT: ASN = 174;
    pub const HURRICANE_ELECTRIC: ASN = 6939;
    pub const TATA: ASN = 6453;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP status {status} from {url}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Could not resolve address {0}")]
    Resolve(String),
    #[error("The route server closed the connection.")]
    ConnectionClosed,
    #[error("The session is already closed.")]
    SessionClosed,
    #[error("Unexpected data format: {0}")]
    Format(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
