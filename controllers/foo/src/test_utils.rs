//! Test utilities for unit testing the reconciler
//!
//! Helpers for creating test Foos, an in-memory cache, and pre-parsed
//! templates.

use crate::templates::Templates;
use controller_core::{ObjectStore, ReconcileRequest};
use crds::{Foo, FooSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::HashMap;
use std::sync::Arc;

/// Helper to create a test Foo with a uid
pub fn test_foo(namespace: &str, name: &str, display_name: &str, uid: &str) -> Foo {
    Foo {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            uid: Some(uid.to_string()),
            ..Default::default()
        },
        spec: FooSpec {
            name: display_name.to_string(),
        },
    }
}

/// The shipped templates, parsed once per call
pub fn test_templates() -> Templates {
    Templates::from_yaml(
        include_str!("../config/configmap.yaml"),
        include_str!("../config/deployment.yaml"),
    )
    .expect("shipped templates must be valid")
}

/// Always-synced in-memory stand-in for the reflector-backed cache
#[derive(Debug, Default)]
pub struct InMemoryStore {
    objects: HashMap<String, Arc<Foo>>,
}

impl InMemoryStore {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with(foo: Foo) -> Self {
        let mut store = Self::default();
        store.insert(foo);
        store
    }

    pub fn insert(&mut self, foo: Foo) {
        let key = format!(
            "{}/{}",
            foo.metadata.namespace.as_deref().unwrap_or_default(),
            foo.metadata.name.as_deref().unwrap_or_default()
        );
        self.objects.insert(key, Arc::new(foo));
    }
}

impl ObjectStore<Foo> for InMemoryStore {
    fn get(&self, key: &ReconcileRequest) -> Option<Arc<Foo>> {
        self.objects.get(&key.to_string()).cloned()
    }

    fn has_synced(&self) -> bool {
        true
    }
}
