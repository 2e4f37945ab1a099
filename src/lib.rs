//! Input preparation and output reading for the hillslope-link model (HLM).
//!
//! Parses `.rvr` topology and `.prm` parameter files, derives initial link
//! states from an outlet baseflow, writes `.ini` state files and `.gbl`
//! global files, and reads simulated time series back per link.

pub mod config;
pub mod error;
pub mod global;
pub mod io;
pub mod network;
pub mod parameters;
pub mod state;
pub mod template;

pub use error::{ConfigError, Error, Result};
