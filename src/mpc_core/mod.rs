//! Protocol-independent building blocks: transport, party utilities, configuration and the
//! authenticated share type.
pub mod config;
pub mod network;
pub mod party;
pub mod share;
