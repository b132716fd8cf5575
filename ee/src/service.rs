use crate::{error::EeError, expr::Expr};
use serde_json::Value;

/// The remote compute service.
///
/// Calls block until the service answers.
pub trait Service {
    /// Evaluates `expr` and returns its materialized JSON value.
    fn compute(&self, expr: &Expr) -> Result<Value, EeError>;

    /// Registers a PNG rendering of the image `expr` and returns the
    /// URL its pixels can be fetched from.
    fn thumbnail_url(&self, expr: &Expr) -> Result<String, EeError>;

    /// Plain GET of `url`.
    fn download(&self, url: &str) -> Result<Vec<u8>, EeError>;
}

impl<S: Service + ?Sized> Service for &S {
    fn compute(&self, expr: &Expr) -> Result<Value, EeError> {
        (**self).compute(expr)
    }

    fn thumbnail_url(&self, expr: &Expr) -> Result<String, EeError> {
        (**self).thumbnail_url(expr)
    }

    fn download(&self, url: &str) -> Result<Vec<u8>, EeError> {
        (**self).download(url)
    }
}
