use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};

use bgp_route_bot::collectors::{IpLookup, PrefixTableCollector};
use bgp_route_bot::{AddressFamily, Config, PathSource, RouteAnalyzer, ASN};

#[derive(Parser, Debug)]
#[command(name = "bgp-route-bot", version, about = "Upstream path summaries from route-server vantage points")]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize the paths feeding an origin ASN
    Analyze {
        #[arg(value_parser = parse_asn)]
        asn: ASN,
        /// Query the IPv6 table
        #[arg(long)]
        ipv6: bool,
        #[arg(long, value_enum, default_value_t = SourceArg::RouteServer)]
        source: SourceArg,
    },
    /// List the prefixes an ASN originates
    Prefixes {
        #[arg(value_parser = parse_asn)]
        asn: ASN,
    },
    /// Find the origin ASN of an address
    Lookup { ip: IpAddr },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SourceArg {
    RouteServer,
    Ris,
}

impl From<SourceArg> for PathSource {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::RouteServer => PathSource::RouteServer,
            SourceArg::Ris => PathSource::Ris,
        }
    }
}

/// Accepts `56040` as well as `AS56040`
fn parse_asn(s: &str) -> Result<ASN, String> {
    let digits = s
        .strip_prefix("AS")
        .or_else(|| s.strip_prefix("as"))
        .unwrap_or(s);
    digits.parse::<ASN>().map_err(|e| format!("invalid ASN '{}': {}", s, e))
}

fn spinner(message: String) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed}]")?);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(message);
    Ok(pb)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Analyze { asn, ipv6, source } => {
            let family = AddressFamily::from_ipv6_flag(ipv6);
            let source = PathSource::from(source);
            let pb = spinner(format!("Collecting {} paths to AS{} from {}", family, asn, source))?;

            let analyzer = RouteAnalyzer::new(config);
            let result = analyzer.analyze(asn, family, source);
            pb.finish_and_clear();
            println!("{}", result?);
        }
        Command::Prefixes { asn } => {
            let pb = spinner(format!("Reading prefix table for AS{}", asn))?;
            let result = PrefixTableCollector::new(config.http).fetch_prefixes(asn);
            pb.finish_and_clear();

            let prefixes = result?;
            println!("AS{} originates {} prefixes", asn, prefixes.len());
            for prefix in prefixes {
                println!("  {}", prefix);
            }
        }
        Command::Lookup { ip } => match IpLookup::new(config.http).lookup(ip)? {
            Some(info) => println!("{}", serde_json::to_string_pretty(&info)?),
            None => println!("No origin found for {}", ip),
        },
    }

    Ok(())
}
