//! ArcGIS Hub client library
//!
//! Permission policies, catalog/collection search over Portal and the Hub
//! Search API, and typed Hub entities composed from Portal items.

pub mod config;
pub mod content;
pub mod context;
pub mod entities;
pub mod error;
pub mod permissions;
pub mod portal;
pub mod search;
pub mod util;

pub use context::{ArcGISContext, ArcGISContextOptions};
pub use error::{Error, Result};
pub use permissions::{
    CheckOptions, Permission, PermissionAccessResponse, PolicyRegistry, check_permission,
};
pub use search::{Catalog, Collection, HubSearchOptions, HubSearchResponse, Query, hub_search};
