//! Foo CRD
//!
//! The primary resource watched by the controller. Each Foo drives one
//! ConfigMap and one Deployment, both owned by the Foo via owner references
//! so the cluster garbage collector cleans them up on delete.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "samples.dev",
    version = "v1",
    kind = "Foo",
    plural = "foos",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct FooSpec {
    /// Display name rendered into the managed ConfigMap's index.html
    pub name: String,
}
