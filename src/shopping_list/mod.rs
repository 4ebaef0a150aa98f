//! Aggregated shopping list for the recipes in a user's cart.

pub mod repo;
pub mod services;

pub use services::{aggregate, render_report, ShoppingItem, REPORT_FILENAME, REPORT_HEADER};
