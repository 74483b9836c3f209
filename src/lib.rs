#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

mod combinator;
mod config;
mod curve;
mod engine;
mod error;
mod family;
mod system;

pub use crate::combinator::{Combinator, CombinatorSpec};
pub use crate::config::{ComboConf, Config, InputConf};
pub use crate::curve::{Curve, CurveSpec};
pub use crate::engine::{NONZERO_FLOOR, NodeKind, NodeRef};
pub use crate::error::*;
pub use crate::family::member;
pub use crate::system::System;

/// Installs a `tracing` subscriber printing to stderr, filtered through the
/// `RUST_LOG` environment variable.
#[cfg(feature = "logging")]
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
