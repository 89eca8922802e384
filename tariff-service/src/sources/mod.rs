pub mod fixed;
pub mod openei;

pub use fixed::StaticRateSource;
pub use openei::OpenEiRateSource;
