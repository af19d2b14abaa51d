//! Cross-crate integration tests.

pub mod container_format;
pub mod flows;
