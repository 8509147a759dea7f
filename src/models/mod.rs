pub mod feature;
pub mod report;
pub mod risk;
pub mod weather;

pub use feature::*;
pub use report::*;
pub use risk::*;
pub use weather::*;
