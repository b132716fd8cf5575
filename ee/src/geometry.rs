//! Boundary geometries.

use crate::{error::EeError, expr::Expr};
use geo::{
    algorithm::BoundingRect,
    geometry::{Coord, Geometry, LineString, Polygon, Rect},
};
use serde_json::{json, Value};

/// Returns a `GeometryConstructors.*` invocation describing `geometry`.
///
/// Only areal geometries and points are accepted since boundaries
/// are used both to filter images and to clip results.
pub fn to_expr(geometry: &Geometry<f64>) -> Result<Expr, EeError> {
    let (function, coordinates) = match geometry {
        Geometry::Point(point) => ("GeometryConstructors.Point", coord(point.0)),
        Geometry::Polygon(polygon) => ("GeometryConstructors.Polygon", polygon_coords(polygon)),
        Geometry::Rect(rect) => (
            "GeometryConstructors.Polygon",
            polygon_coords(&rect.to_polygon()),
        ),
        Geometry::Triangle(triangle) => (
            "GeometryConstructors.Polygon",
            polygon_coords(&triangle.to_polygon()),
        ),
        Geometry::MultiPolygon(multi) => (
            "GeometryConstructors.MultiPolygon",
            Value::Array(multi.iter().map(polygon_coords).collect()),
        ),
        Geometry::Line(_) => return Err(EeError::Geometry("Line")),
        Geometry::LineString(_) => return Err(EeError::Geometry("LineString")),
        Geometry::MultiPoint(_) => return Err(EeError::Geometry("MultiPoint")),
        Geometry::MultiLineString(_) => return Err(EeError::Geometry("MultiLineString")),
        Geometry::GeometryCollection(_) => return Err(EeError::Geometry("GeometryCollection")),
    };
    Ok(Expr::invoke(
        function,
        [("coordinates", Expr::Constant(coordinates))],
    ))
}

/// Returns the lon/lat bounding box of `geometry`.
pub fn bounds(geometry: &Geometry<f64>) -> Result<Rect<f64>, EeError> {
    geometry
        .bounding_rect()
        .ok_or(EeError::Geometry("empty geometry"))
}

fn coord(Coord { x, y }: Coord<f64>) -> Value {
    json!([x, y])
}

fn ring(ring: &LineString<f64>) -> Value {
    Value::Array(ring.coords().copied().map(coord).collect())
}

fn polygon_coords(polygon: &Polygon<f64>) -> Value {
    Value::Array(
        std::iter::once(polygon.exterior())
            .chain(polygon.interiors())
            .map(ring)
            .collect(),
    )
}
