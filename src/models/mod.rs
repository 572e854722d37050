pub mod user;
pub mod scan;
pub mod report;

pub use user::*;
pub use scan::*;
pub use report::*;
