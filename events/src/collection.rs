use crate::{
    composite::Composite,
    error::CollectionError,
    render,
    timeseries::{series_points, TimeSeries, DATE_PATTERN, DATE_PROPERTY},
    viz::VizParams,
};
use chrono::NaiveDate;
use ee::{
    geometry, if_else, list_contains, Date, Dictionary, EeString, Expr, Feature,
    FeatureCollection, Image, ImageCollection, Reducer, Service, INDEX, TIME_START,
};
use geo::geometry::{Geometry, Rect};
use image::RgbImage;
use log::{debug, info, warn};
use serde_json::Value;
use std::{collections::BTreeMap, path::Path};

/// Longest side, in pixels, of requested event thumbnails.
pub const THUMBNAIL_DIMENSIONS: u32 = 512;

/// Default sampling scale of region reductions, in meters.
pub const DEFAULT_REGION_SCALE_M: f64 = 7000.0;

/// Pixel budget of region reductions.
pub const REGION_MAX_PIXELS: f64 = 1e9;

/// Target projection for every image of a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Reprojection {
    /// e.g. `"EPSG:4326"`.
    pub crs: String,

    /// Nominal pixel size in meters.
    pub scale: f64,
}

pub struct CollectionBuilder {
    /// Catalog id of the image collection (required).
    source: String,

    /// Filters input images and clips every event (required).
    boundaries: Geometry<f64>,

    /// Restrict images to `[start, end)`.
    date_range: Option<(NaiveDate, NaiveDate)>,

    /// Band selectors.
    bands: Option<Vec<String>>,

    /// Aggregate pixels with this reducer into the output projection.
    reduce_resolution: Option<Reducer>,

    reprojection: Option<Reprojection>,

    /// Image whose zero pixels mask every collection image.
    mask: Option<Image>,

    /// Multiplicative factor applied to the selected bands.
    scale: Option<f64>,

    /// New names for the selected bands.
    rename: Option<Vec<String>>,
}

impl CollectionBuilder {
    pub fn new(source: impl Into<String>, boundaries: impl Into<Geometry<f64>>) -> Self {
        Self {
            source: source.into(),
            boundaries: boundaries.into(),
            date_range: None,
            bands: None,
            reduce_resolution: None,
            reprojection: None,
            mask: None,
            scale: None,
            rename: None,
        }
    }

    #[must_use]
    pub fn date_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.date_range = Some((start, end));
        self
    }

    #[must_use]
    pub fn bands<I, S>(mut self, bands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bands = Some(bands.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn reduce_resolution(mut self, reducer: Reducer) -> Self {
        self.reduce_resolution = Some(reducer);
        self
    }

    #[must_use]
    pub fn reproject(mut self, crs: impl Into<String>, scale: f64) -> Self {
        self.reprojection = Some(Reprojection {
            crs: crs.into(),
            scale,
        });
        self
    }

    #[must_use]
    pub fn mask(mut self, mask: Image) -> Self {
        self.mask = Some(mask);
        self
    }

    #[must_use]
    pub fn scale(mut self, factor: f64) -> Self {
        self.scale = Some(factor);
        self
    }

    #[must_use]
    pub fn rename<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rename = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Assembles the processed collection.
    ///
    /// Nothing is sent to `service` here; malformed ids or parameters
    /// surface from the first call that evaluates something.
    ///
    /// Processing order is fixed: band selection, date and bounds
    /// filters, then per image resolution reduction, reprojection,
    /// masking, and finally scaling followed by renaming.
    pub fn build<S: Service>(self, service: S) -> Result<Collection<S>, CollectionError> {
        let region = geometry::to_expr(&self.boundaries)?;

        let mut collection = ImageCollection::load(&self.source);
        if let Some(bands) = &self.bands {
            collection = collection.select(bands);
        }
        if let Some((start, end)) = self.date_range {
            collection = collection.filter_date(start, end);
        }
        collection = collection.filter_bounds(&region);

        if let Some(reducer) = &self.reduce_resolution {
            collection = collection.map(|img| img.reduce_resolution(reducer));
        }
        if let Some(Reprojection { crs, scale }) = &self.reprojection {
            collection = collection.map(|img| img.reproject(crs, *scale));
        }
        if let Some(mask) = &self.mask {
            collection = collection.map(|img| img.update_mask(mask));
        }
        if self.scale.is_some() || self.rename.is_some() {
            let bands = self.bands.as_deref();
            let (scale, rename) = (self.scale, self.rename.as_deref());
            collection = collection.map(|img| {
                let mut img = match bands {
                    Some(bands) => img.select(bands),
                    None => img,
                };
                if let Some(factor) = scale {
                    img = img.multiply(factor);
                }
                if let Some(names) = rename {
                    img = img.rename(names);
                }
                img
            });
        }

        debug!("built collection over {}", self.source);
        Ok(Collection {
            service,
            boundaries: self.boundaries,
            region,
            collection,
            events: BTreeMap::new(),
            viz_params: None,
        })
    }
}

/// A processed remote image collection plus the events derived from
/// it.
///
/// Every stored event is clipped to the collection's boundaries.
pub struct Collection<S> {
    service: S,
    boundaries: Geometry<f64>,

    /// `boundaries` as a service geometry.
    region: Expr,

    collection: ImageCollection,
    events: BTreeMap<String, Image>,
    viz_params: Option<VizParams>,
}

impl<S: Service> Collection<S> {
    pub fn boundaries(&self) -> &Geometry<f64> {
        &self.boundaries
    }

    pub fn collection(&self) -> &ImageCollection {
        &self.collection
    }

    pub fn events(&self) -> &BTreeMap<String, Image> {
        &self.events
    }

    pub fn event(&self, name: &str) -> Result<&Image, CollectionError> {
        self.events
            .get(name)
            .ok_or_else(|| CollectionError::UnknownEvent(name.to_owned()))
    }

    /// Composites the images in `[start, end)` and stores the result,
    /// clipped to the boundaries, as `name`.
    ///
    /// `kind` is a reducer tag (see [`Composite::from_tag`]); absent or
    /// unknown tags composite with the mean. An existing event with the
    /// same name is replaced.
    pub fn get_event(&mut self, start: NaiveDate, end: NaiveDate, name: &str, kind: Option<&str>) {
        self.get_composite(start, end, name, Composite::from_tag(kind));
    }

    pub fn get_composite(&mut self, start: NaiveDate, end: NaiveDate, name: &str, composite: Composite) {
        let event = composite
            .apply(&self.collection.filter_date(start, end))
            .clip(&self.region);
        debug!("event {name}: {} over {start}..{end}", composite.tag());
        self.events.insert(name.to_owned(), event);
    }

    /// Stores `name2 - name1`, clipped to the boundaries, as
    /// `new_name`.
    pub fn get_diff_event(&mut self, name1: &str, name2: &str, new_name: &str) -> Result<(), CollectionError> {
        let event1 = self.event(name1)?;
        let event2 = self.event(name2)?;
        let diff = event2.subtract(event1).clip(&self.region);
        debug!("event {new_name}: {name2} - {name1}");
        self.events.insert(new_name.to_owned(), diff);
        Ok(())
    }

    pub fn set_viz_params(&mut self, params: VizParams) {
        self.viz_params = Some(params);
    }

    pub fn viz_params(&self) -> Option<&VizParams> {
        self.viz_params.as_ref()
    }

    /// Bounding box of the boundaries as (lon, lat).
    pub fn extent(&self) -> Result<Rect<f64>, CollectionError> {
        Ok(geometry::bounds(&self.boundaries)?)
    }

    /// Fetches the RGB thumbnail of event `name`, rendered with the
    /// current visualization parameters.
    ///
    /// Every call downloads the thumbnail again.
    pub fn event_raster(&self, name: &str) -> Result<RgbImage, CollectionError> {
        let event = self.event(name)?;
        let viz = self
            .viz_params
            .as_ref()
            .ok_or(CollectionError::MissingVizParams)?;
        let thumbnail = event
            .clip_to_bounds_and_scale(&self.region, THUMBNAIL_DIMENSIONS)
            .visualize(viz.visualization());
        let url = self.service.thumbnail_url(thumbnail.expr())?;
        let bytes = self.service.download(&url)?;
        Ok(image::load_from_memory(&bytes)?.to_rgb8())
    }

    /// Renders event `name` over the boundaries' extent to `out`.
    ///
    /// A colorbar is added when `legend_label` is given and the
    /// visualization parameters have `min`, `max` and `palette`.
    pub fn plot_event(
        &self,
        name: &str,
        title: &str,
        legend_label: Option<&str>,
        out: &Path,
    ) -> Result<(), CollectionError> {
        let raster = self.event_raster(name)?;
        let extent = self.extent()?;
        let colorbar = match (legend_label, &self.viz_params) {
            (Some(label), Some(viz)) => {
                let colorbar = viz.colorbar()?;
                if colorbar.is_none() {
                    warn!("legend '{label}' needs min, max and palette; skipping it");
                }
                colorbar
            }
            _ => None,
        };
        render::raster_map(out, &raster, extent, title, colorbar.as_ref())?;
        info!("rendered event {name} to {}", out.display());
        Ok(())
    }

    fn reduce_regions<F>(&self, collection: &ImageCollection, reducer: Option<&Reducer>, scale: Option<f64>, tag: F) -> FeatureCollection
    where
        F: FnOnce(&Image, Dictionary) -> Dictionary,
    {
        let reducer = reducer.cloned().unwrap_or_default();
        let scale = scale.unwrap_or(DEFAULT_REGION_SCALE_M);
        collection.map_features(|img| {
            let stats = img.reduce_region(&reducer, &self.region, scale, REGION_MAX_PIXELS);
            Feature::new(None, tag(&img, stats))
        })
    }

    /// Reduces every image over the boundaries and returns
    /// `(date, value)` pairs in the order the service lists them.
    ///
    /// `reducer` defaults to the mean and `scale` to
    /// [`DEFAULT_REGION_SCALE_M`].
    pub fn timeseries_points(
        &self,
        reducer: Option<&Reducer>,
        scale: Option<f64>,
    ) -> Result<Vec<(String, Option<f64>)>, CollectionError> {
        let features = self.reduce_regions(&self.collection, reducer, scale, |img, stats| {
            stats.set(DATE_PROPERTY, img.date().format(DATE_PATTERN).into_expr())
        });
        let value = self.service.compute(features.expr())?;
        series_points(&value)
    }

    /// Charts [`Self::timeseries_points`] to `out`.
    ///
    /// Points are drawn in retrieval order; they are not sorted by
    /// date.
    pub fn plot_timeseries(
        &self,
        reducer: Option<&Reducer>,
        scale: Option<f64>,
        title: Option<&str>,
        ylabel: Option<&str>,
        out: &Path,
    ) -> Result<(), CollectionError> {
        let points = self.timeseries_points(reducer, scale)?;
        render::series_chart(
            out,
            &points,
            title.unwrap_or("Time series"),
            ylabel.unwrap_or("Mean value"),
        )?;
        info!("rendered {} point time series to {}", points.len(), out.display());
        Ok(())
    }

    /// Reduces every image over the boundaries into a date sorted
    /// table.
    ///
    /// Images without `system:time_start` get one parsed from the
    /// first eight characters (`yyyyMMdd`) of their `system:index`.
    pub fn to_timeseries_df(
        &self,
        reducer: Option<&Reducer>,
        scale: Option<f64>,
    ) -> Result<TimeSeries, CollectionError> {
        let dated = self.collection.map(|img| {
            let index_date = Date::parse("yyyyMMdd", EeString::from_value(img.get(INDEX)).slice(0, 8));
            let time = if_else(
                list_contains(img.property_names(), Expr::constant(TIME_START)),
                img.get(TIME_START),
                index_date.millis(),
            );
            img.set(TIME_START, time)
        });
        let features = self.reduce_regions(&dated, reducer, scale, |img, stats| {
            let date = Date::from_value(img.get(TIME_START)).format(DATE_PATTERN);
            stats.combine(&Dictionary::from_entries([(DATE_PROPERTY, date.into_expr())]))
        });
        let value = self.service.compute(features.expr())?;
        TimeSeries::from_features(&value)
    }

    /// Materialized description of the processed collection, as
    /// returned by the service.
    pub fn get_info(&self) -> Result<Value, CollectionError> {
        Ok(self.service.compute(self.collection.expr())?)
    }
}

#[cfg(test)]
mod tests {
    use super::{CollectionBuilder, DEFAULT_REGION_SCALE_M, THUMBNAIL_DIMENSIONS};
    use crate::{
        error::CollectionError,
        mock::*,
        render::{MAP_SIZE, SERIES_SIZE},
        viz::VizParams,
    };
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use ee::{Expr, Image, Reducer};
    use geo::{geometry::Geometry, polygon};
    use serde_json::json;
    use std::path::{Path, PathBuf};

    const SOURCE: &str = "MODIS/061/MOD11A2";

    fn region() -> Geometry<f64> {
        polygon![
            (x: -71.5, y: -33.75),
            (x: -70.25, y: -33.75),
            (x: -70.25, y: -32.5),
            (x: -71.5, y: -32.5),
        ]
        .into()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Fresh output path under the system temp dir.
    fn out_png(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("events-{}-{name}.png", std::process::id()));
        let _ = std::fs::remove_file(&path);
        path
    }

    fn features(props: &[serde_json::Value]) -> serde_json::Value {
        let features: Vec<_> = props
            .iter()
            .map(|p| json!({ "type": "Feature", "geometry": null, "properties": p }))
            .collect();
        json!({ "type": "FeatureCollection", "features": features })
    }

    /// Body of a `Collection.map` stage.
    fn stage_body(expr: &Expr) -> &Expr {
        assert_eq!(expr.function_name(), Some("Collection.map"));
        match expr.arg("baseAlgorithm") {
            Some(Expr::Function { body, .. }) => body,
            other => panic!("not a map stage: {other:?}"),
        }
    }

    fn input<'a>(expr: &'a Expr, arg: &str) -> &'a Expr {
        expr.arg(arg)
            .unwrap_or_else(|| panic!("{:?} has no '{arg}'", expr.function_name()))
    }

    fn constant<'a>(expr: &'a Expr, arg: &str) -> &'a serde_json::Value {
        input(expr, arg).as_constant().unwrap()
    }

    #[test]
    fn test_construction_stage_order() {
        let mock = MockService::new();
        let coll = CollectionBuilder::new(SOURCE, region())
            .date_range(ymd(2020, 1, 1), ymd(2021, 1, 1))
            .bands(["LST_Day_1km"])
            .reduce_resolution(Reducer::mean())
            .reproject("EPSG:4326", 1000.0)
            .mask(Image::load("users/test/water_mask"))
            .scale(0.02)
            .rename(["LST"])
            .build(&mock)
            .unwrap();
        assert_eq!(mock.calls(), 0);

        // Last stage: select, then multiply, then rename.
        let outer = coll.collection().expr();
        let rename = stage_body(outer);
        assert_eq!(rename.function_name(), Some("Image.rename"));
        assert_eq!(constant(rename, "names"), &json!(["LST"]));
        let multiply = input(rename, "input");
        assert_eq!(multiply.function_name(), Some("Image.multiply"));
        assert_eq!(
            input(multiply, "image2").arg("value").and_then(Expr::as_constant),
            Some(&json!(0.02))
        );
        let select = input(multiply, "image1");
        assert_eq!(select.function_name(), Some("Image.select"));
        assert_eq!(constant(select, "bandSelectors"), &json!(["LST_Day_1km"]));
        assert!(matches!(input(select, "input"), Expr::Argument(_)));

        let masked = input(outer, "collection");
        let mask = stage_body(masked);
        assert_eq!(mask.function_name(), Some("Image.updateMask"));
        assert_eq!(input(mask, "mask"), Image::load("users/test/water_mask").expr());

        let reprojected = input(masked, "collection");
        let reproject = stage_body(reprojected);
        assert_eq!(reproject.function_name(), Some("Image.reproject"));
        assert_eq!(constant(reproject, "crs"), &json!("EPSG:4326"));
        assert_eq!(constant(reproject, "scale"), &json!(1000.0));

        let reduced = input(reprojected, "collection");
        let reduce = stage_body(reduced);
        assert_eq!(reduce.function_name(), Some("Image.reduceResolution"));
        assert_eq!(input(reduce, "reducer"), Reducer::mean().expr());

        let bounded = input(reduced, "collection");
        assert_eq!(bounded.function_name(), Some("Collection.filter"));
        assert_eq!(
            input(bounded, "filter").function_name(),
            Some("Filter.intersects")
        );
        let dated = input(bounded, "collection");
        assert_eq!(
            input(dated, "filter").function_name(),
            Some("Filter.dateRangeContains")
        );
        let selected = input(dated, "collection");
        assert_eq!(stage_body(selected).function_name(), Some("Image.select"));
        let loaded = input(selected, "collection");
        assert_eq!(loaded.function_name(), Some("ImageCollection.load"));
        assert_eq!(constant(loaded, "id"), &json!(SOURCE));
    }

    #[test]
    fn test_bare_construction() {
        let mock = MockService::new();
        let coll = CollectionBuilder::new(SOURCE, region()).build(&mock).unwrap();
        let expr = coll.collection().expr();
        assert_eq!(expr.function_name(), Some("Collection.filter"));
        assert_eq!(
            input(expr, "collection").function_name(),
            Some("ImageCollection.load")
        );
        assert!(coll.events().is_empty());
    }

    #[test]
    fn test_scale_or_rename_alone() {
        let mock = MockService::new();
        let scaled = CollectionBuilder::new(SOURCE, region())
            .bands(["B4"])
            .scale(1e-4)
            .build(&mock)
            .unwrap();
        let body = stage_body(scaled.collection().expr());
        assert_eq!(body.function_name(), Some("Image.multiply"));
        assert_eq!(
            input(body, "image1").function_name(),
            Some("Image.select")
        );

        let renamed = CollectionBuilder::new(SOURCE, region())
            .bands(["B4"])
            .rename(["red"])
            .build(&mock)
            .unwrap();
        let body = stage_body(renamed.collection().expr());
        assert_eq!(body.function_name(), Some("Image.rename"));
        assert_eq!(input(body, "input").function_name(), Some("Image.select"));
    }

    #[test]
    fn test_unsupported_boundary() {
        let mock = MockService::new();
        let line: Geometry<f64> = geo::LineString::from(vec![(0.0, 0.0), (1.0, 1.0)]).into();
        assert!(matches!(
            CollectionBuilder::new(SOURCE, line).build(&mock),
            Err(CollectionError::Ee(_))
        ));
    }

    #[test]
    fn test_get_event_defaults_to_mean() {
        let mock = MockService::new();
        let mut coll = CollectionBuilder::new(SOURCE, region()).build(&mock).unwrap();
        coll.get_event(ymd(2020, 1, 1), ymd(2020, 2, 1), "default", None);
        coll.get_event(ymd(2020, 1, 1), ymd(2020, 2, 1), "unknown", Some("average"));
        coll.get_event(ymd(2020, 1, 1), ymd(2020, 2, 1), "mean", Some("mean"));

        let mean = coll.event("mean").unwrap();
        assert_eq!(coll.event("default").unwrap(), mean);
        assert_eq!(coll.event("unknown").unwrap(), mean);

        let clip = mean.expr();
        assert_eq!(clip.function_name(), Some("Image.clip"));
        let reduce = input(clip, "input");
        assert_eq!(reduce.function_name(), Some("reduce.mean"));
        assert!(reduce.arg("reducer").is_none());
        let filtered = input(reduce, "collection");
        assert_eq!(
            input(filtered, "filter").function_name(),
            Some("Filter.dateRangeContains")
        );
        assert_eq!(mock.calls(), 0);
    }

    #[test]
    fn test_moisac_tag_mosaics() {
        let mock = MockService::new();
        let mut coll = CollectionBuilder::new(SOURCE, region()).build(&mock).unwrap();
        coll.get_event(ymd(2020, 1, 1), ymd(2020, 2, 1), "m", Some("moisac"));
        let clip = coll.event("m").unwrap().expr();
        assert_eq!(
            input(clip, "input").function_name(),
            Some("ImageCollection.mosaic")
        );

        coll.get_event(ymd(2020, 1, 1), ymd(2020, 2, 1), "m", Some("mosaic"));
        let clip = coll.event("m").unwrap().expr();
        assert_eq!(input(clip, "input").function_name(), Some("reduce.mean"));
    }

    #[test]
    fn test_get_event_overwrites() {
        let mock = MockService::new();
        let mut coll = CollectionBuilder::new(SOURCE, region()).build(&mock).unwrap();
        coll.get_event(ymd(2020, 1, 1), ymd(2020, 2, 1), "e", Some("max"));
        coll.get_event(ymd(2020, 1, 1), ymd(2020, 2, 1), "e", Some("first"));
        assert_eq!(coll.events().len(), 1);
        assert_eq!(
            input(coll.event("e").unwrap().expr(), "input").function_name(),
            Some("Collection.first")
        );
    }

    #[test]
    fn test_diff_event_is_second_minus_first() {
        let mock = MockService::new();
        let mut coll = CollectionBuilder::new(SOURCE, region()).build(&mock).unwrap();
        coll.get_event(ymd(2020, 1, 1), ymd(2020, 2, 1), "before", None);
        coll.get_event(ymd(2021, 1, 1), ymd(2021, 2, 1), "after", None);
        coll.get_event(ymd(2019, 1, 1), ymd(2019, 2, 1), "delta", None);
        coll.get_diff_event("before", "after", "delta").unwrap();

        let before = coll.event("before").unwrap().clone();
        let after = coll.event("after").unwrap().clone();
        let clip = coll.event("delta").unwrap().expr();
        assert_eq!(clip.function_name(), Some("Image.clip"));
        let subtract = input(clip, "input");
        assert_eq!(subtract.function_name(), Some("Image.subtract"));
        assert_eq!(input(subtract, "image1"), after.expr());
        assert_eq!(input(subtract, "image2"), before.expr());
        assert_eq!(input(clip, "geometry"), input(before.expr(), "geometry"));
    }

    #[test]
    fn test_diff_event_unknown_name() {
        let mock = MockService::new();
        let mut coll = CollectionBuilder::new(SOURCE, region()).build(&mock).unwrap();
        coll.get_event(ymd(2020, 1, 1), ymd(2020, 2, 1), "before", None);
        assert!(matches!(
            coll.get_diff_event("before", "after", "delta"),
            Err(CollectionError::UnknownEvent(name)) if name == "after"
        ));
        assert!(matches!(
            coll.get_diff_event("nope", "before", "delta"),
            Err(CollectionError::UnknownEvent(name)) if name == "nope"
        ));
        assert!(coll.event("delta").is_err());
    }

    #[test]
    fn test_plot_unknown_event_fails_before_network() {
        let mock = MockService::serving_png(solid_png(2, 2, [0, 0, 0]));
        let mut coll = CollectionBuilder::new(SOURCE, region()).build(&mock).unwrap();
        coll.set_viz_params(VizParams::new().with("min", 0).with("max", 1));
        let result = coll.plot_event("missing", "title", None, Path::new("unused.png"));
        assert!(matches!(result, Err(CollectionError::UnknownEvent(_))));
        assert_eq!(mock.calls(), 0);
    }

    #[test]
    fn test_raster_needs_viz_params() {
        let mock = MockService::serving_png(solid_png(2, 2, [0, 0, 0]));
        let mut coll = CollectionBuilder::new(SOURCE, region()).build(&mock).unwrap();
        coll.get_event(ymd(2020, 1, 1), ymd(2020, 2, 1), "e", None);
        assert!(matches!(
            coll.event_raster("e"),
            Err(CollectionError::MissingVizParams)
        ));
        assert_eq!(mock.calls(), 0);
    }

    #[test]
    fn test_event_raster() {
        let mock = MockService::serving_png(solid_png(4, 3, [200, 10, 30]));
        let mut coll = CollectionBuilder::new(SOURCE, region()).build(&mock).unwrap();
        coll.get_event(ymd(2020, 1, 1), ymd(2020, 2, 1), "e", None);
        coll.set_viz_params(
            VizParams::new()
                .with("min", 0)
                .with("max", 40)
                .with("palette", json!(["blue", "red"]))
                .with("unit", "°C"),
        );

        for _ in 0..2 {
            let raster = coll.event_raster("e").unwrap();
            assert_eq!(raster.dimensions(), (4, 3));
            assert_eq!(raster.get_pixel(0, 0).0, [200, 10, 30]);
        }
        assert_eq!(mock.thumbnails.borrow().len(), 2);
        assert_eq!(mock.downloads.borrow().len(), 2);
        assert!(mock.computed.borrow().is_empty());

        let thumbnails = mock.thumbnails.borrow();
        let visualize = &thumbnails[0];
        assert_eq!(visualize.function_name(), Some("Image.visualize"));
        assert_eq!(constant(visualize, "max"), &json!(40));
        assert!(visualize.arg("unit").is_none());
        let scaled = input(visualize, "image");
        assert_eq!(scaled.function_name(), Some("Image.clipToBoundsAndScale"));
        assert_eq!(
            constant(scaled, "maxDimension"),
            &json!(THUMBNAIL_DIMENSIONS)
        );
        assert_eq!(input(scaled, "input"), coll.event("e").unwrap().expr());
        assert_eq!(
            mock.downloads.borrow()[0],
            "https://thumbs.invalid/v1/projects/test/thumbnails/1:getPixels"
        );
    }

    #[test]
    fn test_extent() {
        let mock = MockService::new();
        let coll = CollectionBuilder::new(SOURCE, region()).build(&mock).unwrap();
        let extent = coll.extent().unwrap();
        assert_relative_eq!(extent.min().x, -71.5);
        assert_relative_eq!(extent.max().x, -70.25);
        assert_relative_eq!(extent.min().y, -33.75);
        assert_relative_eq!(extent.max().y, -32.5);
    }

    #[test]
    fn test_timeseries_points() {
        let mock = MockService::answering(json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "geometry": null, "properties": { "LST": 300.5, "date": "2020-02-01" } },
                { "type": "Feature", "geometry": null, "properties": { "LST": 299.0, "date": "2020-01-01" } },
            ]
        }));
        let coll = CollectionBuilder::new(SOURCE, region()).build(&mock).unwrap();
        let points = coll.timeseries_points(None, None).unwrap();
        assert_eq!(
            points,
            vec![
                ("2020-02-01".to_owned(), Some(300.5)),
                ("2020-01-01".to_owned(), Some(299.0)),
            ]
        );

        let computed = mock.computed.borrow();
        assert_eq!(computed.len(), 1);
        let feature = stage_body(&computed[0]);
        assert_eq!(feature.function_name(), Some("Feature"));
        let set = input(feature, "metadata");
        assert_eq!(set.function_name(), Some("Dictionary.set"));
        assert_eq!(constant(set, "key"), &json!("date"));
        let stats = input(set, "dictionary");
        assert_eq!(stats.function_name(), Some("Image.reduceRegion"));
        assert_eq!(constant(stats, "scale"), &json!(DEFAULT_REGION_SCALE_M));
        assert_eq!(input(stats, "reducer"), Reducer::mean().expr());
    }

    #[test]
    fn test_to_timeseries_df() {
        let mock = MockService::answering(json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "geometry": null, "properties": { "LST": 300.5, "date": "2020-02-01" } },
                { "type": "Feature", "geometry": null, "properties": { "LST": 299.0 } },
                { "type": "Feature", "geometry": null, "properties": { "LST": 298.0, "date": "2020-01-01" } },
            ]
        }));
        let coll = CollectionBuilder::new(SOURCE, region()).build(&mock).unwrap();
        let table = coll
            .to_timeseries_df(Some(&Reducer::max()), Some(500.0))
            .unwrap();
        assert_eq!(table.columns(), ["LST"]);
        assert_eq!(
            table.column("LST").unwrap(),
            vec![(ymd(2020, 1, 1), Some(298.0)), (ymd(2020, 2, 1), Some(300.5))]
        );

        let computed = mock.computed.borrow();
        let feature = stage_body(&computed[0]);
        let combine = input(feature, "metadata");
        assert_eq!(combine.function_name(), Some("Dictionary.combine"));
        let stats = input(combine, "first");
        assert_eq!(constant(stats, "scale"), &json!(500.0));
        assert_eq!(input(stats, "reducer"), Reducer::max().expr());

        let dated = input(&computed[0], "collection");
        let set = stage_body(dated);
        assert_eq!(set.function_name(), Some("Element.set"));
        assert_eq!(constant(set, "key"), &json!("system:time_start"));
        assert_eq!(input(set, "value").function_name(), Some("Algorithms.If"));
    }

    #[test]
    fn test_get_info_is_verbatim() {
        let info = json!({ "type": "ImageCollection", "bands": [], "features": [] });
        let mock = MockService::answering(info.clone());
        let coll = CollectionBuilder::new(SOURCE, region()).build(&mock).unwrap();
        assert_eq!(coll.get_info().unwrap(), info);
        assert_eq!(&mock.computed.borrow()[0], coll.collection().expr());
    }

    #[test]
    fn test_plot_event_with_colorbar() {
        let mock = MockService::serving_png(solid_png(16, 16, [0, 128, 255]));
        let mut coll = CollectionBuilder::new(SOURCE, region()).build(&mock).unwrap();
        coll.get_event(ymd(2020, 1, 1), ymd(2020, 2, 1), "e", Some("median"));
        coll.set_viz_params(
            VizParams::new()
                .with("min", 0)
                .with("max", 40)
                .with("palette", json!(["040274", "f5f5f5", "ff0000"]))
                .with("unit", "°C")
                .with("value", "LST"),
        );
        let out = out_png("colorbar");
        coll.plot_event("e", "LST", Some("LST"), &out).unwrap();
        assert_eq!(image::image_dimensions(&out).unwrap(), MAP_SIZE);
        assert_eq!(mock.downloads.borrow().len(), 1);
    }

    #[test]
    fn test_plot_event_legend_without_palette() {
        let mock = MockService::serving_png(solid_png(8, 8, [10, 10, 10]));
        let mut coll = CollectionBuilder::new(SOURCE, region()).build(&mock).unwrap();
        coll.get_event(ymd(2020, 1, 1), ymd(2020, 2, 1), "e", None);
        coll.set_viz_params(VizParams::new().with("min", 0));
        let out = out_png("no-palette");
        coll.plot_event("e", "LST", Some("LST"), &out).unwrap();
        assert_eq!(image::image_dimensions(&out).unwrap(), MAP_SIZE);
    }

    #[test]
    fn test_plot_timeseries_without_points() {
        let mock = MockService::answering(features(&[]));
        let coll = CollectionBuilder::new(SOURCE, region()).build(&mock).unwrap();
        let out = out_png("series-empty");
        coll.plot_timeseries(None, None, None, None, &out).unwrap();
        assert_eq!(image::image_dimensions(&out).unwrap(), SERIES_SIZE);
    }

    #[test]
    fn test_plot_timeseries_single_point() {
        let mock = MockService::answering(features(&[json!({ "NDVI": 0.42, "date": "2021-06-01" })]));
        let coll = CollectionBuilder::new(SOURCE, region()).build(&mock).unwrap();
        let out = out_png("series-one");
        coll.plot_timeseries(Some(&Reducer::median()), Some(250.0), Some("NDVI"), Some("NDVI"), &out)
            .unwrap();
        assert_eq!(image::image_dimensions(&out).unwrap(), SERIES_SIZE);
        let computed = mock.computed.borrow();
        let stats = input(input(stage_body(&computed[0]), "metadata"), "dictionary");
        assert_eq!(input(stats, "reducer"), Reducer::median().expr());
    }
}
