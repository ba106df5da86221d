//! Blocking client for the status-page management API.
//!
//! # Overview
//! Maps pages, components, component groups and incidents onto typed calls:
//! build a path, maybe encode a body, send it, decode the JSON reply.
//!
//! # Design
//! - `Client` holds read-only configuration and a [`Transport`]; it never
//!   mutates state after construction and performs no retries or caching.
//! - Request building (`Client::build_request`) and response decoding
//!   (`Client::decode`) are pure; only the transport does I/O.
//! - Resource services borrow the client; composite helpers live on `Client`.
//!
//! ```no_run
//! use statuspage_core::{Client, ComponentStatus, Config, UpdateComponent};
//!
//! let client = Client::new(Config::new("token").with_default_page("page-id"))?;
//! let component = client
//!     .components()
//!     .update("", "component-id", &UpdateComponent::status(ComponentStatus::MajorOutage))?;
//! # Ok::<(), statuspage_core::Error>(())
//! ```

pub mod client;
pub mod composite;
pub mod config;
pub mod error;
pub mod http;
pub mod services;
pub mod transport;
pub mod types;

#[cfg(test)]
mod testing;

pub use client::Client;
pub use config::Config;
pub use error::{Error, Result, UnknownStatus};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use services::{ComponentService, GroupService, IncidentService};
pub use transport::{Transport, UreqTransport};
pub use types::{
    Component, ComponentStatus, Group, Incident, IncidentStatus, IncidentUpdate, Metadata,
    NewComponent, UpdateComponent,
};
