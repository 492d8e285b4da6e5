//! Testing infrastructure: a scripted in-memory feed source.

pub mod mock_source;

pub use mock_source::MockFeedSource;
