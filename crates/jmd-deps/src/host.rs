use std::collections::BTreeSet;

use jmd_core::{ConfigurationBucket, Coordinate};
use serde::{Deserialize, Serialize};

/// A dependency to add to one configuration bucket of the host graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DependencyDeclaration {
    pub bucket: ConfigurationBucket,
    pub coordinate: Coordinate,
}

impl DependencyDeclaration {
    pub fn new(bucket: ConfigurationBucket, coordinate: Coordinate) -> Self {
        Self { bucket, coordinate }
    }
}

/// The host build tool's dependency graph.
pub trait DependencyHandler {
    fn add(&mut self, bucket: ConfigurationBucket, coordinate: &Coordinate);
}

/// Collects declarations in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingHandler {
    pub added: Vec<DependencyDeclaration>,
}

impl DependencyHandler for RecordingHandler {
    fn add(&mut self, bucket: ConfigurationBucket, coordinate: &Coordinate) {
        self.added
            .push(DependencyDeclaration::new(bucket, coordinate.clone()));
    }
}

/// Forwards declarations to a [`DependencyHandler`] at most once per (bucket, coordinate).
#[derive(Debug)]
pub struct Registrar<H> {
    handler: H,
    registered: BTreeSet<DependencyDeclaration>,
}

impl<H: DependencyHandler> Registrar<H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            registered: BTreeSet::new(),
        }
    }

    /// Returns how many declarations were new.
    pub fn register<'a>(
        &mut self,
        declarations: impl IntoIterator<Item = &'a DependencyDeclaration>,
    ) -> usize {
        let mut added = 0;
        for declaration in declarations {
            if self.registered.insert(declaration.clone()) {
                self.handler.add(declaration.bucket, &declaration.coordinate);
                added += 1;
            }
        }
        added
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn into_handler(self) -> H {
        self.handler
    }
}
