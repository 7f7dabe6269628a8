#![deny(unsafe_code)]
//! CLI binary for the lumasort image-morphing system.
//!
//! Subcommands:
//! - `morph`: morph a source image into a target, write PNG frames
//! - `sort`: run only the luminance sorter and report on the mapping
//! - `params`: print tunable parameters, defaults and ranges

mod error;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use image::RgbImage;
use log::{debug, info};
use lumasort_core::controller::DEFAULT_MAX_GRID_SIDE;
use lumasort_core::{
    frame, sort_image, ControllerConfig, InputMode, LumaError, MotionParams,
    TransformController,
};
use lumasort_render::{snapshot, Viewport};

use error::CliError;

#[derive(Parser)]
#[command(name = "lumasort", about = "Luminance-sorted particle image morphing")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Morph a source image into a target and write PNG frames.
    Morph {
        /// Source image (its colors are kept).
        #[arg(short, long)]
        source: PathBuf,

        /// Target image (its composition is reproduced).
        #[arg(short, long)]
        target: PathBuf,

        /// Number of simulation frames.
        #[arg(short, long, default_value_t = 240)]
        frames: usize,

        /// Write every K-th frame (0 writes only the final frame).
        #[arg(short, long, default_value_t = 0)]
        every: usize,

        /// Directory for the PNG frames.
        #[arg(short, long, default_value = "frames")]
        output_dir: PathBuf,

        /// Output width in pixels (defaults to twice the grid width).
        #[arg(short = 'W', long)]
        width: Option<u32>,

        /// Output height in pixels (defaults to twice the grid height).
        #[arg(short = 'H', long)]
        height: Option<u32>,

        /// Largest grid side; bigger sources are scaled down.
        #[arg(long, default_value_t = DEFAULT_MAX_GRID_SIDE)]
        max_grid_side: usize,

        /// Flow-field noise seed.
        #[arg(long, default_value_t = 0)]
        seed: u32,

        /// Motion parameters as a JSON string.
        #[arg(long, default_value = "{}")]
        params: String,
    },
    /// Run the luminance sorter alone and summarise the mapping.
    Sort {
        #[arg(short, long)]
        source: PathBuf,

        #[arg(short, long)]
        target: PathBuf,

        /// Grid as WIDTHxHEIGHT (defaults to the source size, capped).
        #[arg(short, long)]
        grid: Option<String>,
    },
    /// Print motion parameters with their defaults and ranges.
    Params,
}

/// Decodes an image file into an RGB frame.
fn load_rgb(path: &Path) -> Result<RgbImage, CliError> {
    let img = image::open(path)
        .map_err(|e| CliError::Input(format!("cannot read {}: {e}", path.display())))?;
    Ok(img.to_rgb8())
}

/// Parses a `WIDTHxHEIGHT` grid size with both sides non-zero.
fn parse_grid(text: &str) -> Result<(usize, usize), CliError> {
    let bad = || CliError::Input(format!("invalid --grid '{text}', expected WIDTHxHEIGHT"));
    let (w, h) = text.split_once(['x', 'X']).ok_or_else(bad)?;
    let w: usize = w.trim().parse().map_err(|_| bad())?;
    let h: usize = h.trim().parse().map_err(|_| bad())?;
    if w == 0 || h == 0 {
        return Err(bad());
    }
    Ok((w, h))
}

fn frame_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("frame_{index:05}.png"))
}

fn write_frame(
    controller: &TransformController,
    viewport: Viewport,
    path: &Path,
) -> Result<(), CliError> {
    let (gw, gh) = controller
        .grid_dims()
        .ok_or(CliError::Morph(LumaError::MissingSource))?;
    snapshot::write_png(controller.particles(), viewport, gw, gh, path)?;
    debug!("wrote {}", path.display());
    Ok(())
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Params => {
            let info = serde_json::json!({
                "defaults": MotionParams::default().to_json(),
                "schema": MotionParams::schema(),
                "controller": serde_json::to_value(ControllerConfig::default())?,
            });
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                let p = MotionParams::default();
                println!("Motion parameters (defaults):");
                println!("  particle_speed  {}", p.particle_speed);
                println!("  flow_strength   {}", p.flow_strength);
                println!("  noise_scale     {}", p.noise_scale);
                println!("Schema:");
                println!("{}", serde_json::to_string_pretty(&MotionParams::schema())?);
            }
        }
        Command::Sort {
            source,
            target,
            grid,
        } => {
            let source_img = load_rgb(&source)?;
            let target_img = load_rgb(&target)?;
            let (w, h) = match grid {
                Some(text) => parse_grid(&text)?,
                None => frame::grid_dims(
                    source_img.width(),
                    source_img.height(),
                    DEFAULT_MAX_GRID_SIDE,
                )
                .ok_or_else(|| CliError::Input("source image is empty".into()))?,
            };

            let mapping = sort_image(&source_img, &target_img, w, h);
            if mapping.is_empty() {
                return Err(CliError::Input("source or target image is empty".into()));
            }
            let unique: HashSet<_> = mapping.iter().copied().collect();
            let bijective = unique.len() == mapping.len();
            let mean_travel = mapping
                .iter()
                .enumerate()
                .map(|(i, cell)| {
                    let dx = (i % w) as f64 - cell.x as f64;
                    let dy = (i / w) as f64 - cell.y as f64;
                    (dx * dx + dy * dy).sqrt()
                })
                .sum::<f64>()
                / mapping.len() as f64;

            if cli.json {
                let info = serde_json::json!({
                    "grid": [w, h],
                    "cells": mapping.len(),
                    "bijective": bijective,
                    "mean_travel_cells": mean_travel,
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("grid        {w}x{h}");
                println!("cells       {}", mapping.len());
                println!("bijective   {}", if bijective { "yes" } else { "no" });
                println!("mean travel {mean_travel:.2} cells");
            }
        }
        Command::Morph {
            source,
            target,
            frames,
            every,
            output_dir,
            width,
            height,
            max_grid_side,
            seed,
            params,
        } => {
            let params: serde_json::Value = serde_json::from_str(&params)
                .map_err(|e| CliError::Input(format!("invalid --params JSON: {e}")))?;

            let config = ControllerConfig {
                max_grid_side,
                seed,
                ..ControllerConfig::default()
            };
            let mut controller = TransformController::new(config)?;
            controller.set_params(MotionParams::from_json(&params));
            controller.set_input_mode(InputMode::Image);
            controller.load_source_image(load_rgb(&source)?)?;
            controller.load_target_image(load_rgb(&target)?)?;

            // The first update observes the source and lays out the grid.
            controller.update();
            controller.start_transform()?;

            let (gw, gh) = controller
                .grid_dims()
                .ok_or(CliError::Morph(LumaError::MissingSource))?;
            let viewport = Viewport::new(
                width.unwrap_or((gw * 2) as u32),
                height.unwrap_or((gh * 2) as u32),
            );

            fs::create_dir_all(&output_dir).map_err(|e| {
                CliError::Io(format!("cannot create {}: {e}", output_dir.display()))
            })?;

            let mut written = 0usize;
            for index in 0..frames {
                controller.update();
                if every > 0 && index % every == 0 {
                    write_frame(&controller, viewport, &frame_path(&output_dir, index))?;
                    written += 1;
                }
            }
            let last = frame_path(&output_dir, frames);
            write_frame(&controller, viewport, &last)?;
            written += 1;
            info!("morph finished after {frames} frames");

            if cli.json {
                let info = serde_json::json!({
                    "source": source.display().to_string(),
                    "target": target.display().to_string(),
                    "grid": [gw, gh],
                    "viewport": [viewport.width, viewport.height],
                    "frames": frames,
                    "written": written,
                    "final": last.display().to_string(),
                    "params": controller.params().to_json(),
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                eprintln!(
                    "morphed {} -> {} ({gw}x{gh} grid, {frames} frames, {written} written) -> {}",
                    source.display(),
                    target.display(),
                    last.display()
                );
            }
        }
    }

    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let json_mode = cli.json;
    if let Err(e) = run(cli) {
        if json_mode {
            let j = serde_json::json!({"error": e.to_string(), "exit_code": e.exit_code()});
            eprintln!("{}", serde_json::to_string_pretty(&j).unwrap_or_default());
        } else {
            eprintln!("error: {e}");
        }
        process::exit(e.exit_code());
    }
}
