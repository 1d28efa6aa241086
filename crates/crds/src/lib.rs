//! Foo Operator CRD Definitions
//!
//! Kubernetes Custom Resource Definitions for the Foo controller.

pub mod foo;

pub use foo::*;
