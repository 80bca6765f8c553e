//! TaskFlow core: domain store, view projections, persistence bridge, and
//! the REST API around them.

pub mod api;
pub mod models;
pub mod projections;
pub mod store;
