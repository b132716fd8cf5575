use crate::{
    expr::Expr,
    feature::{Date, Dictionary, Feature, FeatureCollection},
    reducer::Reducer,
    TIME_START,
};
use chrono::NaiveDate;
use serde_json::Value;

/// Pixel budget for [`Image::reduce_resolution`].
pub const REDUCE_RESOLUTION_MAX_PIXELS: u32 = 1024;

/// A single (possibly computed) raster.
#[derive(Debug, Clone, PartialEq)]
pub struct Image(Expr);

impl Image {
    /// Loads an image asset by id.
    pub fn load(id: &str) -> Self {
        Self(Expr::invoke("Image.load", [("id", Expr::constant(id))]))
    }

    /// A constant image with `value` in every pixel.
    pub fn constant(value: f64) -> Self {
        Self(Expr::invoke("Image.constant", [("value", Expr::constant(value))]))
    }

    pub fn from_expr(expr: Expr) -> Self {
        Self(expr)
    }

    pub fn expr(&self) -> &Expr {
        &self.0
    }

    pub fn into_expr(self) -> Expr {
        self.0
    }

    pub fn select(&self, bands: &[String]) -> Self {
        Self(Expr::invoke(
            "Image.select",
            [
                ("input", self.0.clone()),
                ("bandSelectors", Expr::constant(bands.to_vec())),
            ],
        ))
    }

    pub fn clip(&self, geometry: &Expr) -> Self {
        Self(Expr::invoke(
            "Image.clip",
            [("input", self.0.clone()), ("geometry", geometry.clone())],
        ))
    }

    /// `self - other`, band by band.
    pub fn subtract(&self, other: &Image) -> Self {
        Self(Expr::invoke(
            "Image.subtract",
            [("image1", self.0.clone()), ("image2", other.0.clone())],
        ))
    }

    pub fn multiply(&self, factor: f64) -> Self {
        Self(Expr::invoke(
            "Image.multiply",
            [("image1", self.0.clone()), ("image2", Self::constant(factor).0)],
        ))
    }

    pub fn rename(&self, names: &[String]) -> Self {
        Self(Expr::invoke(
            "Image.rename",
            [
                ("input", self.0.clone()),
                ("names", Expr::constant(names.to_vec())),
            ],
        ))
    }

    /// Aggregates input pixels into the (coarser) output projection
    /// with `reducer`, on a best effort basis.
    pub fn reduce_resolution(&self, reducer: &Reducer) -> Self {
        Self(Expr::invoke(
            "Image.reduceResolution",
            [
                ("image", self.0.clone()),
                ("reducer", reducer.expr().clone()),
                ("bestEffort", Expr::constant(true)),
                ("maxPixels", Expr::constant(REDUCE_RESOLUTION_MAX_PIXELS)),
            ],
        ))
    }

    pub fn reproject(&self, crs: &str, scale: f64) -> Self {
        Self(Expr::invoke(
            "Image.reproject",
            [
                ("image", self.0.clone()),
                ("crs", Expr::constant(crs)),
                ("scale", Expr::constant(scale)),
            ],
        ))
    }

    pub fn update_mask(&self, mask: &Image) -> Self {
        Self(Expr::invoke(
            "Image.updateMask",
            [("image", self.0.clone()), ("mask", mask.0.clone())],
        ))
    }

    /// Reduces all pixels within `geometry` to a dictionary keyed by
    /// band name.
    pub fn reduce_region(
        &self,
        reducer: &Reducer,
        geometry: &Expr,
        scale: f64,
        max_pixels: f64,
    ) -> Dictionary {
        Dictionary::from_expr(Expr::invoke(
            "Image.reduceRegion",
            [
                ("image", self.0.clone()),
                ("reducer", reducer.expr().clone()),
                ("geometry", geometry.clone()),
                ("scale", Expr::constant(scale)),
                ("maxPixels", Expr::constant(max_pixels)),
            ],
        ))
    }

    /// Renders this image to 8-bit RGB with `params` (`min`, `max`,
    /// `palette`, ...).
    pub fn visualize<'a, I>(&self, params: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a Value)>,
    {
        let args = std::iter::once(("image".to_owned(), self.0.clone())).chain(
            params
                .into_iter()
                .map(|(k, v)| (k.to_owned(), Expr::Constant(v.clone()))),
        );
        Self(Expr::invoke("Image.visualize", args))
    }

    /// Clips to `geometry` and rescales so the longest side is
    /// `max_dimension` pixels.
    pub fn clip_to_bounds_and_scale(&self, geometry: &Expr, max_dimension: u32) -> Self {
        Self(Expr::invoke(
            "Image.clipToBoundsAndScale",
            [
                ("input", self.0.clone()),
                ("geometry", geometry.clone()),
                ("maxDimension", Expr::constant(max_dimension)),
            ],
        ))
    }

    /// Acquisition date, from `system:time_start`.
    pub fn date(&self) -> Date {
        Date::from_value(self.get(TIME_START))
    }

    pub fn get(&self, property: &str) -> Expr {
        Expr::invoke(
            "Element.get",
            [("object", self.0.clone()), ("property", Expr::constant(property))],
        )
    }

    pub fn set(&self, property: &str, value: Expr) -> Self {
        Self(Expr::invoke(
            "Element.set",
            [
                ("object", self.0.clone()),
                ("key", Expr::constant(property)),
                ("value", value),
            ],
        ))
    }

    pub fn property_names(&self) -> Expr {
        Expr::invoke("Element.propertyNames", [("element", self.0.clone())])
    }
}

/// A time ordered stack of images.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageCollection(Expr);

impl ImageCollection {
    /// Loads a catalog collection, e.g. `"MODIS/061/MOD11A2"`.
    pub fn load(id: &str) -> Self {
        Self(Expr::invoke(
            "ImageCollection.load",
            [("id", Expr::constant(id))],
        ))
    }

    pub fn from_expr(expr: Expr) -> Self {
        Self(expr)
    }

    pub fn expr(&self) -> &Expr {
        &self.0
    }

    /// Applies `f` to every image.
    pub fn map<F>(&self, f: F) -> Self
    where
        F: FnOnce(Image) -> Image,
    {
        Self(self.map_expr(|img| f(img).0))
    }

    /// Turns every image into a feature.
    pub fn map_features<F>(&self, f: F) -> FeatureCollection
    where
        F: FnOnce(Image) -> Feature,
    {
        FeatureCollection::from_expr(self.map_expr(|img| f(img).into_expr()))
    }

    fn map_expr<F>(&self, f: F) -> Expr
    where
        F: FnOnce(Image) -> Expr,
    {
        Expr::invoke(
            "Collection.map",
            [
                ("collection", self.0.clone()),
                ("baseAlgorithm", Expr::lambda(|arg| f(Image(arg)))),
            ],
        )
    }

    pub fn select(&self, bands: &[String]) -> Self {
        self.map(|img| img.select(bands))
    }

    /// Keeps images whose `system:time_start` lies in `[start, end)`.
    pub fn filter_date(&self, start: NaiveDate, end: NaiveDate) -> Self {
        let range = Expr::invoke(
            "DateRange",
            [
                ("start", Date::from_naive(start).expr().clone()),
                ("end", Date::from_naive(end).expr().clone()),
            ],
        );
        self.filter(Expr::invoke(
            "Filter.dateRangeContains",
            [
                ("leftValue", range),
                ("rightField", Expr::constant(TIME_START)),
            ],
        ))
    }

    /// Keeps images whose footprint intersects `geometry`.
    pub fn filter_bounds(&self, geometry: &Expr) -> Self {
        self.filter(Expr::invoke(
            "Filter.intersects",
            [
                ("leftField", Expr::constant(".all")),
                ("rightValue", geometry.clone()),
            ],
        ))
    }

    fn filter(&self, filter: Expr) -> Self {
        Self(Expr::invoke(
            "Collection.filter",
            [("collection", self.0.clone()), ("filter", filter)],
        ))
    }

    /// Per-pixel reduction across all images.
    ///
    /// Output bands carry the reducer's suffix, e.g. `LST_stdDev`. The
    /// shorthands below ([`Self::mean`], [`Self::sum`], ...) keep the
    /// input band names.
    pub fn reduce(&self, reducer: &Reducer) -> Image {
        Image(Expr::invoke(
            "ImageCollection.reduce",
            [
                ("collection", self.0.clone()),
                ("reducer", reducer.expr().clone()),
            ],
        ))
    }

    pub fn mean(&self) -> Image {
        self.aggregate("reduce.mean")
    }

    pub fn sum(&self) -> Image {
        self.aggregate("reduce.sum")
    }

    pub fn median(&self) -> Image {
        self.aggregate("reduce.median")
    }

    pub fn min(&self) -> Image {
        self.aggregate("reduce.min")
    }

    pub fn max(&self) -> Image {
        self.aggregate("reduce.max")
    }

    pub fn count(&self) -> Image {
        self.aggregate("reduce.count")
    }

    fn aggregate(&self, function: &str) -> Image {
        Image(Expr::invoke(function, [("collection", self.0.clone())]))
    }

    /// Stacks images, later ones on top.
    pub fn mosaic(&self) -> Image {
        Image(Expr::invoke(
            "ImageCollection.mosaic",
            [("collection", self.0.clone())],
        ))
    }

    pub fn first(&self) -> Image {
        Image(Expr::invoke("Collection.first", [("collection", self.0.clone())]))
    }

    /// Most recent image by `system:time_start`.
    pub fn last(&self) -> Image {
        let latest = Expr::invoke(
            "Collection.limit",
            [
                ("collection", self.0.clone()),
                ("limit", Expr::constant(1)),
                ("key", Expr::constant(TIME_START)),
                ("ascending", Expr::constant(false)),
            ],
        );
        Image(Expr::invoke("Collection.first", [("collection", latest)]))
    }
}
