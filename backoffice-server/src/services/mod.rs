//! Service layer
//!
//! - [`menu_access`] - resolves the menu tree a user may see
//! - [`menu_hierarchy`] - flat menu list to nested tree
//! - [`menu_admin`] - menu mutations and admin read models
//! - [`bootstrap`] - first-run admin account

pub mod bootstrap;
pub mod menu_access;
pub mod menu_admin;
pub mod menu_hierarchy;

pub use menu_access::{AccessSource, get_user_menus};
pub use menu_hierarchy::build_menu_hierarchy;
