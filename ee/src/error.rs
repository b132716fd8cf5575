use thiserror::Error;

#[derive(Error, Debug)]
pub enum EeError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("service error {code}: {message}")]
    Service { code: u16, message: String },

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed response, {0}")]
    Response(String),

    #[error("unsupported boundary geometry {0}")]
    Geometry(&'static str),
}
