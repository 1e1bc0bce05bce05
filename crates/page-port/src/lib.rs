//! Document port: the only way the filtering pipeline touches the host page.
//!
//! [`DocumentPort`] is the narrow interface; [`InMemoryDocument`] is an adapter backed by
//! a `scraper` HTML tree, used by tests and the CLI in place of a live browser.
pub mod errors;
pub mod memory;
pub mod model;
pub mod ports;

pub use errors::{PortError, Result};
pub use memory::InMemoryDocument;
pub use model::{ElementSpec, MutationBatch, PageFixture};
pub use ports::{location_path, DocumentPort};
