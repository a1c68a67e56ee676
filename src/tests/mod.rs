// Test modules for llm-debate crate
//
// Test organization follows the template pattern where each source file
// has a corresponding test file that focuses on business logic verification.

// Test helper utilities
pub mod helpers;

pub mod debate;

// NOTE: HTTP round trips are covered by integration tests in tests/ using wiremock
