//! Pure mappings from upstream payloads to metric samples.
//!
//! Each translator takes one typed payload plus the [`ScrapeContext`] and
//! returns the samples for its data group. Translators do no I/O and keep no
//! state; the `server`/`node` labels are applied later by the collector.
//!
//! [`ScrapeContext`]: crate::config::ScrapeContext

pub mod dashboard;
pub mod dhcp;
pub mod top;
pub mod zones;

pub use top::TopLists;
