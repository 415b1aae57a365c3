//! Data models for the application
//!
//! Each sub-module covers one domain area: organizations and their members,
//! principle templates, invitations, and the review request graph.

mod invitation;
mod organization;
mod quarter;
mod review;
mod template;
mod user;

pub use invitation::*;
pub use organization::*;
pub use quarter::*;
pub use review::*;
pub use template::*;
pub use user::*;
