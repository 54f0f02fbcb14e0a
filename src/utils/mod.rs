//! Utility functions
//!
//! Network helpers shared by the control and data channels.

pub mod network;
