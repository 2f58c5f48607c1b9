//! Ordersync - CRM order to scheduling-dashboard sync.
//!
//! Receives order-creation webhooks from the CRM, drives a WebDriver-controlled
//! browser to ensure the client exists in the scheduling dashboard, and records
//! the outcome of every order in a month-keyed spreadsheet ledger.

pub mod auth;
pub mod calendar;
pub mod config;
pub mod driver;
pub mod export;
pub mod interfaces;
pub mod model;
pub mod pipeline;
pub mod resolver;
pub mod server;
pub mod session;
pub mod sheets;
pub mod worker;

pub mod test_utils;
