//! Serialization boundaries of the core.
//!
//! File-format readers live outside this crate and hand over
//! [`AtomRecord`](crate::core::models::atom::AtomRecord)s. This module only
//! provides the flat [`transfer::TransferRecord`] encoding, used to move a
//! complete structure between processes or threads.

pub mod transfer;
