//! Cucumber step definitions for behavior tests.

pub mod suite_execution;
