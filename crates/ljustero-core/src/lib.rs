#![forbid(unsafe_code)]

//! Core types shared by every ljustero crate.

pub mod algorithm;
pub mod error;
pub mod ns;

pub use error::{Error, Result};
