//! Data models for the CMS.
//!
//! Field names serialize in camelCase to match the admin front-end.

mod article;
mod content;
mod coupon;
mod game;
mod home_page;
mod page;
mod promotion;
mod site;
mod user;

pub use article::*;
pub use content::*;
pub use coupon::*;
pub use game::*;
pub use home_page::*;
pub use page::*;
pub use promotion::*;
pub use site::*;
pub use user::*;
