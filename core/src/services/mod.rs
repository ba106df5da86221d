//! Resource services.
//!
//! Each service borrows the [`Client`](crate::Client) and adds path
//! construction and typed payloads for one resource kind. Services are
//! created on demand via `Client::components()`, `Client::groups()` and
//! `Client::incidents()` and hold no state of their own.

mod component;
mod group;
mod incident;

pub use component::ComponentService;
pub use group::GroupService;
pub use incident::IncidentService;
