pub mod project_queries;
pub mod user_queries;
