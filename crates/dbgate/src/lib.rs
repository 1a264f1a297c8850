//! dbgate runtime: routing, dispatch and the connection pool.
//!
//! The binary in `main.rs` wires these into the CLI; everything here is
//! usable without a listening socket.

pub mod db;
pub mod gateway;
pub mod router;

pub use db::create_pool;
pub use gateway::{Gateway, GatewayError};
pub use router::{RouteMatch, Router};
