//! Identity types for metacards

/// Metacard identifier. DDF ids are opaque strings, usually 32 hex chars.
pub type MetacardId = String;

/// SHA-256 digest used for metacard fingerprints.
pub type ContentHash = [u8; 32];
