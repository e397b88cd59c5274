//! Session/credential lifecycle for the streamhub account service: paired
//! access and refresh tokens, rotation-on-use, and the relational reads
//! keyed by the authenticated identity.

pub mod auth;
pub mod catalog;
pub mod error;
pub mod media;
pub mod model;
pub mod query;
pub mod session;
pub mod store;
pub mod token;
