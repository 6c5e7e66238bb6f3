//! Integration test suite.
//!
//! Tests are organized by concern:
//! 1. Dirty tracking
//! 2. Partial updates
//! 3. Relation reconciliation
//! 4. Lifecycle hooks
//! 5. Concurrent workers
//! 6. Schema and config files

pub mod concurrency_tests;
pub mod partial_update_tests;
pub mod relation_tests;
