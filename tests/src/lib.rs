//! # SaveBridge Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Shared save/key fixtures
//! │
//! └── integration/      # Cross-crate choreography
//!     ├── flows.rs          # Export/import/copy flows end to end
//!     └── container_format.rs # On-disk container layout checks
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p savebridge-tests
//!
//! # One area
//! cargo test -p savebridge-tests integration::flows::
//! ```

pub mod fixtures;
pub mod integration;
