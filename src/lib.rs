// Re-export all public modules
pub mod shared;
pub mod labels;
pub mod as_path;
pub mod route_server;
pub mod retry;
pub mod analysis;
pub mod collectors;
pub mod cache;
pub mod config;
pub mod runner;

// Re-export commonly used types at the crate root
pub use analysis::{summarize_for_asn, summarize_generic, summarize_specialized, Report, Summarizer};
pub use as_path::{clean_as_path, dedup_labels, labeled_path};
pub use config::Config;
pub use labels::{normalize, LabelRules};
pub use route_server::{parse_line, ParsedRoute, RouteServerClient, Session};
pub use runner::RouteAnalyzer;
pub use shared::{AddressFamily, CommonASNs, Error, Label, PathSource, Result, ASN};
