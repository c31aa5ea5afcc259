// Card Fee Calculator - Core Library
// Exposes the fee core and history store to the terminal UI, the web server and tests

pub mod fees;
pub mod calculator;
pub mod history;
pub mod error;
pub mod format;
pub mod config;
pub mod session;

#[cfg(feature = "server")]
pub mod web;

// Re-export commonly used types
pub use fees::{
    FeeEntry, FeeKey, FeeTable, Modality,
    STANDARD_TABLE, MIN_INSTALLMENTS, MAX_INSTALLMENTS,
};
pub use calculator::{FeeInverter, GrossResult};
pub use history::{CalculationRecord, HistoryStore, TIMESTAMP_FORMAT};
pub use error::{FeeError, HistoryError, SessionError};
pub use format::{format_brl, parse_amount};
pub use config::Config;
pub use session::CalculatorSession;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
