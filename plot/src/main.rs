mod boundary;
mod options;

use anyhow::{Context, Error as AnyError};
use clap::Parser;
use ee::{Credentials, EarthEngine, Image, Service};
use events::{Collection, CollectionBuilder, VizParams};
use log::info;
use options::{Cli, Command as CliCmd, Render, Window};
use std::{fs::File, io::Write, path::Path, time::Duration};
use textplots::{Chart, Plot, Shape};

fn main() -> Result<(), AnyError> {
    let Cli {
        project,
        token,
        base_url,
        timeout,
        source,
        boundary,
        start,
        end,
        bands,
        reduce_resolution,
        crs,
        crs_scale,
        mask,
        scale,
        rename,
        cmd,
    } = Cli::parse();

    env_logger::init();

    let service = EarthEngine::initialize(Credentials {
        project,
        access_token: token,
        base_url,
        timeout: timeout.map(Duration::from_secs),
    })?;

    let boundaries = boundary::open(&boundary)
        .with_context(|| format!("reading boundary {}", boundary.display()))?;
    info!("using {source} in project {}", service.project());
    let mut builder = CollectionBuilder::new(source, boundaries);
    if let (Some(start), Some(end)) = (start, end) {
        builder = builder.date_range(start, end);
    }
    if !bands.is_empty() {
        builder = builder.bands(bands);
    }
    if let Some(reducer) = reduce_resolution {
        builder = builder.reduce_resolution(reducer);
    }
    if let (Some(crs), Some(crs_scale)) = (crs, crs_scale) {
        builder = builder.reproject(crs, crs_scale);
    }
    if let Some(mask) = mask {
        builder = builder.mask(Image::load(&mask));
    }
    if let Some(scale) = scale {
        builder = builder.scale(scale);
    }
    if !rename.is_empty() {
        builder = builder.rename(rename);
    }
    let mut collection = builder.build(&service)?;

    match cmd {
        CliCmd::Info => print_info(&collection),
        CliCmd::Event {
            window: Window { start, end, kind },
            render,
        } => {
            let name = format!("{start}..{end}");
            collection.get_event(start, end, &name, kind.as_deref());
            plot(&mut collection, &name, render)
        }
        CliCmd::Diff {
            before_from,
            before_to,
            after_from,
            after_to,
            kind,
            render,
        } => {
            collection.get_event(before_from, before_to, "before", kind.as_deref());
            collection.get_event(after_from, after_to, "after", kind.as_deref());
            collection.get_diff_event("before", "after", "difference")?;
            plot(&mut collection, "difference", render)
        }
        CliCmd::Timeseries {
            reduction,
            title,
            ylabel,
            out: Some(out),
        } => Ok(collection.plot_timeseries(
            Some(&reduction.reducer),
            Some(reduction.sample_scale),
            title.as_deref(),
            ylabel.as_deref(),
            &out,
        )?),
        CliCmd::Timeseries {
            reduction,
            out: None,
            ..
        } => {
            let points =
                collection.timeseries_points(Some(&reduction.reducer), Some(reduction.sample_scale))?;
            plot_ascii(&points);
            Ok(())
        }
        CliCmd::Table { reduction, json } => {
            let table =
                collection.to_timeseries_df(Some(&reduction.reducer), Some(reduction.sample_scale))?;
            let stdout = std::io::stdout().lock();
            if json {
                serde_json::to_writer(stdout, &table)?;
            } else {
                table.write_csv(stdout)?;
            }
            Ok(())
        }
    }
}

fn print_info<S: Service>(collection: &Collection<S>) -> Result<(), AnyError> {
    let info = collection.get_info()?;
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &info)?;
    writeln!(stdout)?;
    Ok(())
}

fn plot<S: Service>(collection: &mut Collection<S>, name: &str, render: Render) -> Result<(), AnyError> {
    let Render {
        viz,
        title,
        legend,
        out,
    } = render;
    collection.set_viz_params(read_viz(&viz)?);
    collection.plot_event(name, &title, legend.as_deref(), &out)?;
    Ok(())
}

fn read_viz(path: &Path) -> Result<VizParams, AnyError> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    Ok(serde_json::from_reader(file)?)
}

/// Plots values against their retrieval index in the terminal.
fn plot_ascii(points: &[(String, Option<f64>)]) {
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    let plot_data: Vec<(f32, f32)> = points
        .iter()
        .enumerate()
        .filter_map(|(idx, (_, v))| v.map(|v| (idx as f32, v as f32)))
        .collect();
    if let (Some((first, _)), Some((last, _))) = (points.first(), points.last()) {
        println!("{first} .. {last}");
    }
    #[allow(clippy::cast_precision_loss)]
    let xmax = points.len().max(1) as f32;
    Chart::new(300, 150, 0.0, xmax)
        .lineplot(&Shape::Lines(&plot_data))
        .display();
}
