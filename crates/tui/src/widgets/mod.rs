//! Widgets for the controller screen.

pub mod role_table;

pub use role_table::render_role_table;
