//! Query building for models
//!
//! Models collect filters, orders, field selections and pagination here;
//! [`Slang`] compiles them into parameterized statements.

pub mod filter;
pub mod ordering;
pub mod pagination;
pub mod query;
pub mod slang;
pub mod state;


pub use filter::{Filter, FilterKind};
pub use ordering::{Order, SortOrder};
pub use pagination::{Field, Limit, Offset};
pub use query::{Parameters, Query};
pub use slang::Slang;
pub use state::{QueryNode, QueryState};
