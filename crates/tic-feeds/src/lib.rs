//! Short-link resolution, feed adapters, and the unified URL threat cache.
//! Everything here is async and network-facing; the cache is the only
//! long-lived state and owns its own serialization point.

pub mod adapters;
pub mod cache;
pub mod resolver;

pub use adapters::{FeedAdapter, OpenPhishAdapter, PhishTankAdapter, UrlhausAdapter};
pub use cache::{RefreshStats, UrlThreatCache};
pub use resolver::{is_short_link, resolve, ResolveResult};
