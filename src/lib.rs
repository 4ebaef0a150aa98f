pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod importer;
pub mod ingredients;
pub mod pagination;
pub mod query;
pub mod recipes;
pub mod relations;
pub mod shopping_list;
pub mod state;
pub mod storage;
pub mod tags;
pub mod users;
