//! The nutrilog store server, shared by the `nutrilog-server` binary and its tests.

pub mod server;
