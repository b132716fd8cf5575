use anyhow::{bail, Result};
use geo::geometry::{Geometry, GeometryCollection, MultiPolygon};
use geojson::{quick_collection, GeoJson};
use std::{fs::File, path::Path};

/// Reads the boundary from a GeoJSON file.
///
/// Several polygons are merged into one multipolygon.
pub fn open(path: &Path) -> Result<Geometry<f64>> {
    let file = File::open(path)?;
    let geojson = GeoJson::from_reader(file)?;
    let collection: GeometryCollection<f64> = quick_collection(&geojson)?;
    merge(collection)
}

fn merge(collection: GeometryCollection<f64>) -> Result<Geometry<f64>> {
    let mut polygons = Vec::new();
    for geometry in collection {
        match geometry {
            Geometry::Polygon(polygon) => polygons.push(polygon),
            Geometry::MultiPolygon(multi) => polygons.extend(multi),
            Geometry::Rect(rect) => polygons.push(rect.to_polygon()),
            other => bail!("boundary must be areal, got {other:?}"),
        }
    }
    match polygons.len() {
        0 => bail!("boundary has no polygons"),
        1 => Ok(Geometry::Polygon(polygons.remove(0))),
        _ => Ok(Geometry::MultiPolygon(MultiPolygon(polygons))),
    }
}
