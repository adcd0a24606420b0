//! Cross-module tests and shared test doubles.


/// One-page text PDF: a title line, a rent clause and a termination clause.
pub const LEASE_PDF: &[u8] = include_bytes!("fixtures/lease.pdf");
