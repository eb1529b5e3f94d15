//! Mutation operation implementations.
//!
//! Each operation (create, set, link/unlink, delete) is implemented
//! in its own module for better organization and testability.

mod create;
mod delete;
mod link;
mod set;

pub use create::create_instance;
pub use delete::delete_instance;
pub use link::{create_link, remove_link, remove_link_by_id};
pub use set::set_attribute;
