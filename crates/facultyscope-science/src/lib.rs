//! Author-identity resolution and bibliographic aggregation for faculty profiles.

pub mod aggregator;
pub mod citations;
pub mod directory;
pub mod error;
pub mod http;
pub mod identifiers;
pub mod matching;
pub mod resolver;
pub mod sources;

pub use aggregator::{AuthorStats, CollaboratorAggregate, MetadataAggregator, Tag, VenueCount};
pub use error::{Result, ScienceError};
pub use identifiers::Doi;
pub use resolver::AuthorResolver;
