pub mod project;
pub mod rate_proposal;
pub mod user;

pub use project::{currency_from_f64, NewProject, Project};
pub use rate_proposal::{NewRateProposal, RateProposal};
pub use user::User;
