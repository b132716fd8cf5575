//! Recording stand-in for the remote service.

use ee::{EeError, Expr, Service};
use image::{ImageFormat, Rgb, RgbImage};
use serde_json::Value;
use std::{cell::RefCell, io::Cursor};

#[derive(Default)]
pub struct MockService {
    /// Answer to every `compute` call.
    pub response: Value,

    /// Body of every download.
    pub png: Vec<u8>,

    pub computed: RefCell<Vec<Expr>>,
    pub thumbnails: RefCell<Vec<Expr>>,
    pub downloads: RefCell<Vec<String>>,
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answering(response: Value) -> Self {
        Self {
            response,
            ..Self::default()
        }
    }

    pub fn serving_png(png: Vec<u8>) -> Self {
        Self {
            png,
            ..Self::default()
        }
    }

    /// Total number of service round trips.
    pub fn calls(&self) -> usize {
        self.computed.borrow().len() + self.thumbnails.borrow().len() + self.downloads.borrow().len()
    }
}

impl Service for MockService {
    fn compute(&self, expr: &Expr) -> Result<Value, EeError> {
        self.computed.borrow_mut().push(expr.clone());
        Ok(self.response.clone())
    }

    fn thumbnail_url(&self, expr: &Expr) -> Result<String, EeError> {
        let mut thumbnails = self.thumbnails.borrow_mut();
        thumbnails.push(expr.clone());
        Ok(format!(
            "https://thumbs.invalid/v1/projects/test/thumbnails/{}:getPixels",
            thumbnails.len()
        ))
    }

    fn download(&self, url: &str) -> Result<Vec<u8>, EeError> {
        self.downloads.borrow_mut().push(url.to_owned());
        Ok(self.png.clone())
    }
}

/// Encodes a solid `width` x `height` PNG.
pub fn solid_png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb(color));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}
