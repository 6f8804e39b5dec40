//! Attendance Service - proximity-bound attendance sessions.
//!
//! A presenter opens a short-lived session bound to their network origin; a
//! participant on the same origin redeems it exactly once after passing the
//! identity gate.

pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
