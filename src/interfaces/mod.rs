//! Abstract interfaces for ordersync capabilities.
//!
//! These traits define the contracts for:
//! - Browser driving (page interaction over WebDriver)
//! - Browser-session persistence (the reusable login artifact)
//! - The spreadsheet ledger (month tables)

pub mod driver;
pub mod session_store;
pub mod sheet_store;

pub use driver::{DriverError, DriverSession, SessionState};
pub use session_store::SessionStore;
pub use sheet_store::{SheetStore, StoreError, TableHandle};
