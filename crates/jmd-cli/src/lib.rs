//! Library side of the `jmd` binary.
//!
//! `main.rs` only parses arguments and renders output; loading configuration and snapshots and
//! running units lives here so integration tests can drive it without spawning the binary.

pub mod session;

pub use session::{
    check, load_projects, synthesize_project, CheckOutcome, LoadedProject, Session,
};
