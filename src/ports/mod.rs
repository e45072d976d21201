//! Port traits for the collaborators around the replay core.

pub mod config_port;
pub mod data_port;
