pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod filter;
pub mod hierarchy;
pub mod http;
pub mod service;
pub mod sparql;
pub mod store;
pub mod traversal;
pub mod vocab;

pub use config::Config;
pub use error::{HierarchyError, Result};
pub use hierarchy::{HierarchyDefinition, HierarchyResolver};
pub use service::{Direction, HierarchyService, TraversalRequest};
pub use store::{GraphStore, SparqlClient};
pub use traversal::ConceptRef;
