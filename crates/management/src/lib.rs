//! Ads management backend: campaigns, plans, targeting edits, lifecycle,
//! and placement resolution.
//!
//! Data stored in DashMap (development); swap to PostgreSQL for production.

pub mod handlers;
pub mod models;
pub mod plans;
pub mod router;
pub mod store;

pub use handlers::{ApiError, ManagementState};
pub use plans::PlanCatalog;
pub use router::{management_router, router_with_state};
pub use store::CampaignStore;
