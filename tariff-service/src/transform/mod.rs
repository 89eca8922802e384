//! Pure request-independent logic: turning raw rate items into tariffs and
//! tariffs into cost projections. Nothing in here performs I/O.

pub mod projection;
pub mod selection;

pub use projection::{first_year_cost, project, DEFAULT_PROJECTION_YEARS};
pub use selection::{select, RateRecord, Selection, Tariff};
