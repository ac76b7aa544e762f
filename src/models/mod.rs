//! Data models owned by the remote file-store service.
//!
//! The client never mutates these records; it only replaces its view of the
//! collection after a successful mutation round-trip.

pub mod file;
