pub mod identity;
pub mod oauth;
pub mod session;

pub use identity::*;
pub use oauth::*;
pub use session::*;
