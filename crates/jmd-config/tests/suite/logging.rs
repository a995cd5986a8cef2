use std::sync::{Arc, Mutex};

use jmd_core::{Coordinate, ModuleName};
use jmd_mapping::MappingStore;
use tracing::Event;
use tracing_subscriber::{layer::Context, prelude::*, EnvFilter, Layer};

#[derive(Clone, Default)]
struct CapturingLayer {
    targets: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for CapturingLayer
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        self.targets
            .lock()
            .expect("targets mutex poisoned")
            .push(event.metadata().target().to_string());
    }
}

fn build_store() {
    let mut builder = MappingStore::builder();
    builder.add_user_mapping(
        ModuleName::parse("org.slf4j").unwrap(),
        Coordinate::parse("org.slf4j:slf4j-api").unwrap(),
    );
    builder.build();
}

fn captured_targets(directives: &str) -> Vec<String> {
    let layer = CapturingLayer::default();
    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::new(directives))
        .with(layer.clone());
    tracing::subscriber::with_default(subscriber, build_store);
    let targets = layer.targets.lock().expect("targets mutex poisoned").clone();
    targets
}

#[test]
fn dotted_targets_select_crate_events() {
    let targets = captured_targets("warn,jmd.mapping=debug");
    assert!(!targets.is_empty());
    assert!(targets.iter().all(|t| t == "jmd.mapping"), "{targets:?}");

    assert!(captured_targets("warn,jmd.deps=debug").is_empty());
}
