//! Transport-independent CRUD dispatch for Rested.
//!
//! A [`Dispatcher`] turns verb invocations on one collection into
//! [`Outcome`] values. Rights are enforced through the collection's
//! [`RightsPolicy`](rested_gate::RightsPolicy); a denied caller is told which
//! methods they could use, or that the resource does not exist when there
//! are none.
//!
//! # Key Types
//!
//! - [`Dispatcher`]: The eight verb handlers plus [`Dispatcher::dispatch`]
//! - [`Request`]: A verb invocation as handed over by a transport
//! - [`OperationContext`]: Caller context, requested [`Format`], `If-Modified-Since`
//! - [`ListQuery`]: Paging, ordering and filter parameters for listings
//! - [`Outcome`]: Closed set of results with status-code mapping

pub mod context;
pub mod dispatcher;
pub mod error;
pub mod outcome;
pub mod query;
pub mod request;

pub use context::{Format, OperationContext};
pub use dispatcher::Dispatcher;
pub use error::{QueryError, QueryResult};
pub use outcome::{ErrorDetail, Outcome};
pub use query::{ListPlan, ListQuery, Page, PageStart};
pub use request::Request;
