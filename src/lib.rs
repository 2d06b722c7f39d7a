pub mod cli;
pub mod error;
pub mod model;
pub mod parser;
pub mod pca;
pub mod processor;
pub mod writer;

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, anyhow};
use clap::Parser;
use tracing::info;

use cli::Command;
use model::{Curation, GameMode, ROUND_DIGITS};
use pca::{FitOptions, ProjectionModel};
use processor::{BatchReport, VectorizeOptions, assembler};
use writer::DatasetWriter;

pub fn run() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    match args.command {
        Command::Vectorize {
            mode,
            curation,
            sources,
            maps_dir,
            spaces_dir,
            min_extent,
        } => {
            let options = VectorizeOptions {
                mode,
                curation,
                min_extent,
            };
            vectorize(&options, &sources, &maps_dir, &spaces_dir)?;
        }
        Command::Fit {
            space,
            spaces_dir,
            models_dir,
            max_components,
            scale,
        } => {
            let options = FitOptions {
                scale,
                max_components,
            };
            fit(&space, &spaces_dir, &models_dir, options)?;
        }
        Command::Components { model, map } => {
            let model = writer::model::load(&model)
                .with_context(|| format!("Loading model {}", model.display()))?;
            let map = parser::load_map_file(&map)?;
            let curation = assembler::curation_for(&model.dataset().meta.dimension_ranges)
                .ok_or_else(|| anyhow!("model dataset does not match any known curation"))?;

            let mut vector = assembler::assemble(&map, curation)
                .with_context(|| format!("Encoding map {}", map.name))?;
            assembler::round_vector(&mut vector, ROUND_DIGITS);
            let components = model.predict(&vector)?;
            println!("{}", serde_json::to_string(&components)?);
        }
        Command::Reconstruct { model, components } => {
            let model = writer::model::load(&model)
                .with_context(|| format!("Loading model {}", model.display()))?;
            let vector = model.invert(&components)?;
            println!("{}", serde_json::to_string(&vector)?);
        }
    }

    Ok(())
}

/// `MODE-CURATION-SOURCE1-SOURCE2…`
pub fn space_name(mode: GameMode, curation: Curation, sources: &[String]) -> String {
    let mut parts = vec![mode.name().to_string(), curation.name().to_string()];
    parts.extend(
        sources
            .iter()
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty()),
    );
    parts.join("-")
}

pub fn vectorize(
    options: &VectorizeOptions,
    sources: &[String],
    maps_dir: &Path,
    spaces_dir: &Path,
) -> anyhow::Result<BatchReport> {
    let name = space_name(options.mode, options.curation, sources);

    // 1. ── Collect map files ─────────────────────────────────────────
    info!("Reading map sources...");
    let mut paths = Vec::new();
    for source in sources.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let dir = maps_dir.join(source.to_lowercase());
        paths.extend(parser::list_map_files(&dir)?);
    }

    // 2. ── Open the space file ───────────────────────────────────────
    std::fs::create_dir_all(spaces_dir)
        .with_context(|| format!("Creating {}", spaces_dir.display()))?;
    let out_path = spaces_dir.join(format!("{name}.json"));
    let file =
        File::create(&out_path).with_context(|| format!("Creating {}", out_path.display()))?;
    let ranges = assembler::describe(options.curation);
    let mut sink = DatasetWriter::new(BufWriter::new(file), &ranges)?;

    // 3. ── Encode ────────────────────────────────────────────────────
    info!("Generating map vectors...");
    let maps = paths.iter().map(|p| (p.display().to_string(), parser::load_map_file(p)));
    let report = processor::run(maps, options, &mut sink)?;
    let rows = sink.rows();
    sink.finish()?;

    info!(rows, "Finished generating dataspace {name}.json");
    Ok(report)
}

pub fn fit(
    space: &str,
    spaces_dir: &Path,
    models_dir: &Path,
    options: FitOptions,
) -> anyhow::Result<ProjectionModel> {
    let in_path = spaces_dir.join(format!("{space}.json"));
    let json = std::fs::read_to_string(&in_path)
        .with_context(|| format!("Reading {}", in_path.display()))?;
    let dataset = parser::load_dataset(&json)?;

    let model = ProjectionModel::fit_with(dataset, options)
        .with_context(|| format!("Fitting model for {space}"))?;
    if let Some(total) = model.cumulative_variance().last() {
        info!(
            components = model.component_count(),
            "Explained variance: {:.2}%",
            total * 100.0
        );
    }

    info!("Writing...");
    let out_path = models_dir.join(format!("{space}.json"));
    writer::model::emit(&model, &out_path)
        .with_context(|| format!("Writing {}", out_path.display()))?;
    info!("Generated.");
    Ok(model)
}
