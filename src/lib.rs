#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod analysis;
pub(crate) mod api;
pub mod app;
pub mod artifacts;
pub mod classification;
pub mod config;
pub mod observability;
