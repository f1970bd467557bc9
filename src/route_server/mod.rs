pub mod parser;
pub mod session;
pub mod transport;

pub use parser::{parse_line, parse_lines, ParsedRoute};
pub use session::{Session, SessionState};
pub use transport::{TelnetTransport, Transport};

use crate::config::RouteServerConfig;
use crate::retry::with_retry;
use crate::shared::{AddressFamily, Result, ASN};

/// `show bgp` variants filtered to routes originated by `asn`, in the
/// order they are tried against CLIs of different dialects.
pub fn query_commands(asn: ASN, family: AddressFamily) -> Vec<String> {
    match family {
        AddressFamily::Ipv4 => vec![
            format!("show ip bgp regexp _{}$", asn),
            format!("show bgp ipv4 unicast regexp _{}$", asn),
            format!("show bgp regexp _{}$", asn),
        ],
        AddressFamily::Ipv6 => vec![
            format!("show ipv6 bgp regexp _{}$", asn),
            format!("show bgp ipv6 unicast regexp _{}$", asn),
            format!("show bgp ipv6 regexp _{}$", asn),
        ],
    }
}

/// Scrapes routes by origin ASN from a public route server
pub struct RouteServerClient {
    config: RouteServerConfig,
}

impl RouteServerClient {
    pub fn new(config: RouteServerConfig) -> Self {
        RouteServerClient { config }
    }

    pub fn config(&self) -> &RouteServerConfig {
        &self.config
    }

    /// Returns the parsed routes and the number of raw lines received.
    pub fn fetch_prefix_aspaths_by_origin_asn(
        &self,
        asn: ASN,
        family: AddressFamily,
    ) -> Result<(Vec<ParsedRoute>, usize)> {
        let config = &self.config;
        self.fetch_with(asn, family, || {
            TelnetTransport::connect(&config.host, config.port, config.connect_timeout())
        })
    }

    /// Same as [`Self::fetch_prefix_aspaths_by_origin_asn`], with every
    /// attempt opening its transport through `connect`.
    pub fn fetch_with<T, C>(
        &self,
        asn: ASN,
        family: AddressFamily,
        mut connect: C,
    ) -> Result<(Vec<ParsedRoute>, usize)>
    where
        T: Transport,
        C: FnMut() -> Result<T>,
    {
        let commands = query_commands(asn, family);
        let policy = self.config.retry_policy();

        with_retry(&policy, "Route server fetch", |attempt| {
            log::debug!("Fetching AS{} {} routes, attempt {}", asn, family, attempt);
            let transport = connect()?;
            let mut session = Session::new(transport, self.config.clone());
            session.login()?;
            let lines = session.probe(&commands, self.config.command_timeout())?;
            session.close()?;

            let routes = parse_lines(&lines);
            log::info!(
                "AS{}: parsed {} routes from {} lines",
                asn,
                routes.len(),
                lines.len()
            );
            Ok((routes, lines.len()))
        })
    }
}
