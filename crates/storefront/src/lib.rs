//! Shopfront library.
//!
//! A small shop with server-rendered pages for browsing and administering
//! products, and a JSON API over users, products and categories. The binary
//! in `main.rs` only wires configuration, logging and the server around
//! [`routes::build_router`], so everything here can be exercised in tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod flash;
pub mod middleware;
pub mod models;
pub mod page;
pub mod routes;
pub mod services;
pub mod state;
