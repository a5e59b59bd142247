//! CLI command implementations

pub(crate) mod common;
pub(crate) mod id;
pub(crate) mod units;
pub(crate) mod vape;
