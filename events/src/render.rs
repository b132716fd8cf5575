//! PNG figures.

use crate::{error::CollectionError, viz::Colorbar};
use geo::geometry::Rect;
use image::{imageops::FilterType, RgbImage};
use plotters::{
    coord::Shift,
    prelude::*,
    style::text_anchor::{HPos, Pos, VPos},
};
use std::path::Path;

/// Event map figure size, in pixels.
pub const MAP_SIZE: (u32, u32) = (800, 600);

/// Time series figure size, in pixels.
pub const SERIES_SIZE: (u32, u32) = (800, 400);

/// Height of the strip below the map reserved for a colorbar.
const LEGEND_HEIGHT: u32 = 110;

const LINE_COLOR: RGBColor = RGBColor(31, 119, 180);

fn draw_err<E: std::error::Error + Send + Sync>(e: DrawingAreaErrorKind<E>) -> CollectionError {
    CollectionError::Draw(e.to_string())
}

/// Draws `raster` stretched over `extent` (row 0 at the northern
/// edge) on longitude/latitude axes, with an optional colorbar
/// underneath.
pub fn raster_map(
    out: &Path,
    raster: &RgbImage,
    extent: Rect<f64>,
    title: &str,
    colorbar: Option<&Colorbar>,
) -> Result<(), CollectionError> {
    let root = BitMapBackend::new(out, MAP_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;

    let (map_area, legend_area) = match colorbar {
        Some(_) => {
            let (map, legend) = root.split_vertically(MAP_SIZE.1 - LEGEND_HEIGHT);
            (map, Some(legend))
        }
        None => (root.clone(), None),
    };

    let (lon, lat) = (
        extent.min().x..extent.max().x,
        extent.min().y..extent.max().y,
    );
    let mut chart = ChartBuilder::on(&map_area)
        .caption(title, ("sans-serif", 28))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(lon.clone(), lat.clone())
        .map_err(draw_err)?;
    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("Longitude")
        .y_desc("Latitude")
        .axis_desc_style(("sans-serif", 16))
        .draw()
        .map_err(draw_err)?;

    let (width, height) = chart.plotting_area().dim_in_pixel();
    let stretched = image::imageops::resize(raster, width, height, FilterType::Nearest);
    let bitmap: BitMapElement<(f64, f64)> =
        BitMapElement::with_owned_buffer((lon.start, lat.end), (width, height), stretched.into_raw())
            .ok_or_else(|| CollectionError::Draw("raster buffer does not match plot area".into()))?;
    chart
        .draw_series(std::iter::once(bitmap))
        .map_err(draw_err)?;

    if let (Some(area), Some(colorbar)) = (legend_area, colorbar) {
        draw_colorbar(&area, colorbar)?;
    }

    root.present().map_err(draw_err)?;
    Ok(())
}

fn draw_colorbar<DB>(area: &DrawingArea<DB, Shift>, colorbar: &Colorbar) -> Result<(), CollectionError>
where
    DB: DrawingBackend,
{
    let area = area.margin(5, 5, 120, 200);
    let mut chart = ChartBuilder::on(&area)
        .x_label_area_size(45)
        .build_cartesian_2d(colorbar.min..colorbar.max, 0.0..1.0)
        .map_err(draw_err)?;
    chart
        .configure_mesh()
        .disable_mesh()
        .disable_y_axis()
        .x_labels(6)
        .x_label_style(("sans-serif", 12))
        .x_desc(colorbar.caption.as_str())
        .axis_desc_style(("sans-serif", 14))
        .draw()
        .map_err(draw_err)?;

    let lut = colorbar.colormap.lut();
    let step = (colorbar.max - colorbar.min) / lut.len() as f64;
    chart
        .draw_series(lut.iter().enumerate().map(|(i, color)| {
            let x0 = colorbar.min + step * i as f64;
            Rectangle::new([(x0, 0.0), (x0 + step, 1.0)], color.filled())
        }))
        .map_err(draw_err)?;
    Ok(())
}

/// Draws `points` as markers joined by lines, in the given order.
///
/// Missing values leave a gap in the line.
pub fn series_chart(
    out: &Path,
    points: &[(String, Option<f64>)],
    title: &str,
    y_desc: &str,
) -> Result<(), CollectionError> {
    let root = BitMapBackend::new(out, SERIES_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;

    let xy: Vec<(f64, Option<f64>)> = points
        .iter()
        .enumerate()
        .map(|(i, (_, v))| (i as f64, *v))
        .collect();
    let (lo, hi) = value_range(xy.iter().filter_map(|(_, v)| *v));
    let last = points.len().max(1) as f64 - 0.5;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 22))
        .margin(10)
        .x_label_area_size(90)
        .y_label_area_size(70)
        .build_cartesian_2d(-0.5..last, lo..hi)
        .map_err(draw_err)?;

    // Dates are drawn below, the mesh only provides the axis.
    chart
        .configure_mesh()
        .disable_x_mesh()
        .bold_line_style(BLACK.mix(0.15))
        .light_line_style(TRANSPARENT)
        .x_label_formatter(&|_: &f64| String::new())
        .x_desc("Date")
        .y_desc(y_desc)
        .axis_desc_style(("sans-serif", 14))
        .draw()
        .map_err(draw_err)?;

    let label_style = TextStyle::from(("sans-serif", 11).into_font())
        .transform(FontTransform::Rotate90)
        .pos(Pos::new(HPos::Left, VPos::Center));
    let step = points.len().div_ceil(24).max(1);
    for (i, (date, _)) in points.iter().enumerate().step_by(step) {
        let (px, py) = chart.backend_coord(&(i as f64, lo));
        root.draw_text(date, &label_style, (px, py + 6))
            .map_err(draw_err)?;
    }

    for run in runs(&xy) {
        chart
            .draw_series(LineSeries::new(run, LINE_COLOR.stroke_width(1)))
            .map_err(draw_err)?;
    }
    chart
        .draw_series(
            xy.iter()
                .filter_map(|&(x, v)| v.map(|y| Circle::new((x, y), 3, LINE_COLOR.filled()))),
        )
        .map_err(draw_err)?;

    root.present().map_err(draw_err)?;
    Ok(())
}

/// Splits a series at missing values.
fn runs(xy: &[(f64, Option<f64>)]) -> Vec<Vec<(f64, f64)>> {
    let mut runs = vec![Vec::new()];
    for &(x, v) in xy {
        match v {
            Some(y) => {
                if let Some(run) = runs.last_mut() {
                    run.push((x, y));
                }
            }
            None => runs.push(Vec::new()),
        }
    }
    runs.retain(|run| !run.is_empty());
    runs
}

/// Y axis range covering `values` with 5% padding.
fn value_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if lo > hi {
        (0.0, 1.0)
    } else if lo == hi {
        (lo - 1.0, hi + 1.0)
    } else {
        let pad = (hi - lo) * 0.05;
        (lo - pad, hi + pad)
    }
}
