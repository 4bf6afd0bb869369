//! Protected-infrastructure registry, phone/domain reputation stores, and
//! the community-report store. All mutation here is funneled through
//! either atomic SQL increments (phone/domain reputation) or a
//! persist-then-memory-update discipline (community reports) so
//! concurrent callers never see a partially-applied write.

pub mod community;
pub mod domain_store;
pub mod phone_store;
pub mod registry;

pub use community::CommunityReportStore;
pub use domain_store::DomainReputationStore;
pub use phone_store::PhoneReputationStore;
pub use registry::is_protected;
