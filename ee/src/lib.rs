//! # Earth Engine expressions
//!
//! `ee` builds declarative computations for the Earth Engine API and
//! sends them to the service. Nothing is evaluated locally: every
//! handle in this crate ([`Image`], [`ImageCollection`], [`Reducer`],
//! ...) is just a wrapper around an [`Expr`] tree which is encoded and
//! shipped to a [`Service`] when a result is actually needed.

mod client;
mod error;
pub mod expr;
mod feature;
pub mod geometry;
mod image;
mod reducer;
mod service;

pub use crate::{
    client::{Credentials, EarthEngine, DEFAULT_BASE_URL},
    error::EeError,
    expr::Expr,
    feature::{if_else, list_contains, Date, Dictionary, EeString, Feature, FeatureCollection},
    image::{Image, ImageCollection, REDUCE_RESOLUTION_MAX_PIXELS},
    reducer::{Reducer, UnknownReducer},
    service::Service,
};
pub use {chrono, geo};

/// Property holding an image's acquisition time in epoch milliseconds.
pub const TIME_START: &str = "system:time_start";

/// Property holding an image's identifier within its collection.
pub const INDEX: &str = "system:index";
