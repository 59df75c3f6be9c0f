//! PeopleFlow: a user-directory service.
//!
//! A REST API for listing, searching, paginating, viewing, creating, editing,
//! deleting and CSV-exporting user records. Records live in Postgres behind
//! the [`users::store::UserStore`] adapter; profile images live on an external
//! media host behind [`media::MediaStore`]. The [`ui`] module holds the
//! per-view state machines and the HTTP client that drive the API.

pub mod app;
pub mod config;
pub mod error;
pub mod media;
pub mod state;
pub mod ui;
pub mod users;
