use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use ee::{Reducer, DEFAULT_BASE_URL};
use events::DEFAULT_REGION_SCALE_M;
use std::path::PathBuf;

/// Composite, difference and chart remote image collections.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Cloud project requests are billed to.
    #[arg(long, env = "EE_PROJECT")]
    pub project: String,

    /// OAuth2 access token, e.g. from `gcloud auth print-access-token`.
    #[arg(long, env = "EE_ACCESS_TOKEN", hide_env_values = true)]
    pub token: String,

    /// API root.
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Request timeout in seconds (waits forever if absent).
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Image collection id, e.g. "MODIS/061/MOD11A2".
    #[arg(short, long)]
    pub source: String,

    /// GeoJSON file with the boundary polygon(s).
    #[arg(short, long)]
    pub boundary: PathBuf,

    /// Only use images from this date on (YYYY-MM-DD).
    #[arg(long, requires = "end")]
    pub start: Option<NaiveDate>,

    /// Only use images before this date (YYYY-MM-DD).
    #[arg(long, requires = "start")]
    pub end: Option<NaiveDate>,

    /// Bands to select.
    #[arg(long, value_delimiter = ',')]
    pub bands: Vec<String>,

    /// Reduce resolution with this reducer.
    #[arg(long)]
    pub reduce_resolution: Option<Reducer>,

    /// Reproject to this CRS, e.g. "EPSG:4326".
    #[arg(long, requires = "crs_scale")]
    pub crs: Option<String>,

    /// Pixel size in meters when reprojecting.
    #[arg(long, requires = "crs")]
    pub crs_scale: Option<f64>,

    /// Mask every image with this image asset.
    #[arg(long)]
    pub mask: Option<String>,

    /// Multiply selected bands by this factor.
    #[arg(long)]
    pub scale: Option<f64>,

    /// Rename selected bands.
    #[arg(long, value_delimiter = ',')]
    pub rename: Vec<String>,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the processed collection's description as JSON.
    Info,

    /// Composite a date range and render it.
    Event {
        #[command(flatten)]
        window: Window,

        #[command(flatten)]
        render: Render,
    },

    /// Render the difference of two composites, `after - before`.
    Diff {
        #[arg(long)]
        before_from: NaiveDate,

        #[arg(long)]
        before_to: NaiveDate,

        #[arg(long)]
        after_from: NaiveDate,

        #[arg(long)]
        after_to: NaiveDate,

        /// Composite tag for both ranges.
        #[arg(long)]
        kind: Option<String>,

        #[command(flatten)]
        render: Render,
    },

    /// Chart the per-image region reduction.
    Timeseries {
        #[command(flatten)]
        reduction: Reduction,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        ylabel: Option<String>,

        /// PNG output path. Plots to the terminal if absent.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Print the per-image region reduction as a date sorted table.
    Table {
        #[command(flatten)]
        reduction: Reduction,

        /// Print JSON records instead of CSV.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Args)]
pub struct Window {
    /// First day of the composite (YYYY-MM-DD).
    #[arg(long = "from")]
    pub start: NaiveDate,

    /// Day after the composite (YYYY-MM-DD).
    #[arg(long = "to")]
    pub end: NaiveDate,

    /// Composite tag: sum, median, min, max, std, first, last, count,
    /// moisac or mean.
    #[arg(long)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct Render {
    /// JSON file with visualization parameters.
    #[arg(long)]
    pub viz: PathBuf,

    #[arg(long)]
    pub title: String,

    /// Add a colorbar.
    #[arg(long)]
    pub legend: Option<String>,

    /// PNG output path.
    #[arg(short, long)]
    pub out: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub struct Reduction {
    /// Spatial reducer.
    #[arg(long, default_value = "mean")]
    pub reducer: Reducer,

    /// Sampling scale in meters.
    #[arg(long, default_value_t = DEFAULT_REGION_SCALE_M)]
    pub sample_scale: f64,
}
