//! Captive-portal login replay.
//!
//! Wifi gateways that intercept traffic until a login page is accepted can
//! be satisfied by replaying the browser request that worked once. This
//! crate parses a hand-saved recording of that request, resolves
//! `${placeholder}` tokens against live network facts, checks whether the
//! connection is currently intercepted, and replays the login with bounded
//! retry.

pub mod cli;
pub mod error;
pub mod placeholder;
pub mod probe;
pub mod registry;
pub mod replay;
pub mod retry;
pub mod run;
pub mod store;
pub mod template;

pub use cli::Cli;
pub use error::{Error, ParseError, Result};
pub use placeholder::{substitute, substitute_template, FactSource, SubstitutionContext};
pub use probe::{build_client, probe, ProbeExpectation, ProbeResult};
pub use registry::Registry;
pub use replay::{replay, ReplaySummary};
pub use retry::{with_retry, Retryable};
pub use run::{run, RunOptions};
pub use store::find_template;
pub use template::{Method, RequestTemplate};
