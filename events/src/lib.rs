//! # Events
//!
//! Named temporal composites ("events") over a remote image
//! collection, their differences, and PNG renderings of both.
//!
//! ```no_run
//! use ee::{chrono::NaiveDate, geo::{polygon, Geometry}, Credentials, EarthEngine};
//! use events::{CollectionBuilder, VizParams};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let ee = EarthEngine::initialize(Credentials::new("my-project", "ya29...."))?;
//! let region: Geometry<f64> = polygon![
//!     (x: -71.7, y: -33.6),
//!     (x: -70.4, y: -33.6),
//!     (x: -70.4, y: -32.9),
//! ]
//! .into();
//! let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
//!
//! let mut lst = CollectionBuilder::new("MODIS/061/MOD11A2", region)
//!     .date_range(date(2023, 1, 1), date(2024, 1, 1))
//!     .bands(["LST_Day_1km"])
//!     .scale(0.02)
//!     .rename(["LST"])
//!     .build(&ee)?;
//! lst.get_event(date(2023, 1, 1), date(2023, 3, 1), "summer", None);
//! lst.get_event(date(2023, 6, 1), date(2023, 9, 1), "winter", None);
//! lst.get_diff_event("winter", "summer", "delta")?;
//! lst.set_viz_params(
//!     VizParams::new()
//!         .with("min", -10)
//!         .with("max", 10)
//!         .with("palette", vec!["0000ff", "ffffff", "ff0000"])
//!         .with("unit", "K")
//!         .with("value", "LST"),
//! );
//! lst.plot_event("delta", "Summer minus winter", Some("LST"), Path::new("delta.png"))?;
//! # Ok(())
//! # }
//! ```

mod collection;
mod composite;
mod error;
#[cfg(test)]
mod mock;
pub mod render;
mod timeseries;
mod viz;

pub use crate::{
    collection::{
        Collection, CollectionBuilder, Reprojection, DEFAULT_REGION_SCALE_M, REGION_MAX_PIXELS,
        THUMBNAIL_DIMENSIONS,
    },
    composite::{Composite, MOSAIC_TAG},
    error::CollectionError,
    timeseries::{series_points, TimeSeries, TimeSeriesRow, DATE_FORMAT, DATE_PATTERN, DATE_PROPERTY},
    viz::{parse_color, Colorbar, Colormap, VizParams, COLORMAP_LEN, VISUALIZATION_KEYS},
};
