//! Renderings of a persisted [`Report`](crate::models::Report).
//!
//! Both renderers take their diagnosis-specific wording from
//! [`Diagnosis`], so the plain-text download and the printable HTML page
//! never disagree.

pub mod diagnosis;
pub mod html;
pub mod text;

pub use diagnosis::Diagnosis;
pub use html::render_html;
pub use text::render_text;
