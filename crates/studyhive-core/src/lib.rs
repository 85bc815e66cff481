//! Core types and trait definitions for the StudyHive library.
//!
//! Holds the domain model, validation rules, the [`store::LibraryStore`]
//! abstraction and the recommendation engine. No HTTP or SQL lives here.

// Store impls use `async fn`; the trait spells out the `Send` bounds.
#![allow(async_fn_in_trait)]

pub mod catalog;
pub mod error;
pub mod interaction;
pub mod recommend;
pub mod resource;
pub mod store;
pub mod user;
pub mod youtube;

pub use error::{Error, Result};
