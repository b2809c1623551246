//! Client library for the hugd admin listener.
//!
//! Provides [`AdminClient`], which maps one call onto each admin route.

mod admin_client;

pub use admin_client::AdminClient;
