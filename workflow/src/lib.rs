pub mod block;
pub mod connection;
pub mod constants;
pub mod document;
pub mod error;
pub mod graph;
pub mod paths;
pub mod prelude;
pub mod protocol;
pub mod rect;

pub use error::Rejection;
