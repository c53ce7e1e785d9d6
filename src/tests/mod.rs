// Test modules for csr-errors crate
//
// Each source module has a corresponding test file that focuses on business
// logic verification.

// Shared fixtures
pub mod helpers;

pub mod handler;
pub mod presentation;
