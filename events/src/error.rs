use ee::EeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CollectionError {
    #[error("no event named '{0}'")]
    UnknownEvent(String),

    #[error("visualization parameters have not been set")]
    MissingVizParams,

    #[error("{0}")]
    Ee(#[from] EeError),

    #[error("{0}")]
    Image(#[from] image::ImageError),

    #[error("drawing failed, {0}")]
    Draw(String),

    #[error("invalid date '{value}', {source}")]
    Date {
        value: String,
        source: chrono::ParseError,
    },

    #[error("invalid palette color '{0}'")]
    Palette(String),

    #[error("malformed reduction result, {0}")]
    Reduction(String),

    #[error("{0}")]
    Csv(#[from] csv::Error),
}
