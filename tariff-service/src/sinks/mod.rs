pub mod memory;
pub mod postgres;

pub use memory::MemoryProjectStore;
pub use postgres::PgProjectStore;
