//! Bootstrap installer for the MC Server Termux manager
//!
//! The binary (`mcst-install`) is a thin wrapper; everything lives under
//! [`install`] so the pipeline can be driven with fake collaborators.

pub mod cli;
pub mod config;
pub mod install;
