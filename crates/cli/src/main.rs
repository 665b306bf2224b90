#![deny(unsafe_code)]
//! CLI binary for the LIC workspace.
//!
//! Subcommands:
//! - `render <field>`: sample a named field, run LIC, write PNG
//! - `list`: print available fields, kernels and colormaps

mod error;

use clap::{Parser, Subcommand};
use error::CliError;
use lic_core::{
    render, AxisSpacing, Bounds, Indexing, Integrator, KernelShape, Precision, Recipe, Scalar,
    ShadeParams,
};
use lic_render::{snapshot, Colormap, FieldKind, RenderOptions};
use std::path::{Path, PathBuf};
use std::process;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "lic", about = "Line integral convolution renderer")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct RenderArgs {
    /// Field name (e.g. "vortex"). Optional when --recipe is given.
    #[arg(required_unless_present = "recipe")]
    field: Option<String>,

    /// Output image side length in pixels.
    #[arg(long, default_value_t = 256)]
    size: usize,

    /// Streamline steps per direction.
    #[arg(short, long, default_value_t = 25)]
    steps: usize,

    /// Streamline step length, in pixels.
    #[arg(long, default_value_t = 0.5)]
    step_length: f64,

    /// Kernel profile (sine, box, gaussian).
    #[arg(short, long, default_value = "sine")]
    kernel: String,

    /// Number of convolution passes.
    #[arg(long, default_value_t = 1)]
    iterations: usize,

    /// Use RK4 instead of Euler steps.
    #[arg(long)]
    rk4: bool,

    /// Noise texture seed.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Precision of the sampled mesh (single, double).
    #[arg(long, default_value = "double")]
    precision: String,

    /// Sampled box: left edge.
    #[arg(long, default_value_t = -1.0, allow_hyphen_values = true)]
    x0: f64,
    /// Sampled box: right edge.
    #[arg(long, default_value_t = 1.0, allow_hyphen_values = true)]
    x1: f64,
    /// Sampled box: bottom edge.
    #[arg(long, default_value_t = -1.0, allow_hyphen_values = true)]
    y0: f64,
    /// Sampled box: top edge.
    #[arg(long, default_value_t = 1.0, allow_hyphen_values = true)]
    y1: f64,

    /// Mesh samples per axis.
    #[arg(long, default_value_t = 64)]
    mesh: usize,

    /// Log-spaced mesh axes instead of linear ones.
    #[arg(long)]
    log_mesh: bool,

    /// Build the mesh with matrix (ij) indexing.
    #[arg(long)]
    ij: bool,

    /// Output window bounds. Integers are precision-neutral; "1.0" is double.
    #[arg(long, value_parser = parse_scalar, allow_hyphen_values = true)]
    xmin: Option<Scalar>,
    #[arg(long, value_parser = parse_scalar, allow_hyphen_values = true)]
    xmax: Option<Scalar>,
    #[arg(long, value_parser = parse_scalar, allow_hyphen_values = true)]
    ymin: Option<Scalar>,
    #[arg(long, value_parser = parse_scalar, allow_hyphen_values = true)]
    ymax: Option<Scalar>,

    /// Colormap name (gray, inferno, viridis, ocean).
    #[arg(short, long, default_value = "gray")]
    colormap: String,

    /// Blend the colormapped field magnitude over the texture.
    #[arg(long)]
    overlay: bool,

    /// Add hillshade relief.
    #[arg(long)]
    shade: bool,

    /// Field parameters as a JSON string.
    #[arg(long, default_value = "{}")]
    params: String,

    /// Read every setting from a recipe file instead of the flags.
    #[arg(long)]
    recipe: Option<PathBuf>,

    /// Also write the effective recipe to this file.
    #[arg(long)]
    save_recipe: Option<PathBuf>,

    /// Output file path.
    #[arg(short, long, default_value = "lic.png")]
    output: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Render a named field with LIC and write a PNG.
    Render(RenderArgs),
    /// List available fields, kernels and colormaps.
    List,
}

/// Integer text becomes a neutral bound, anything else a double.
fn parse_scalar(s: &str) -> Result<Scalar, String> {
    if let Ok(i) = s.parse::<i64>() {
        return Ok(Scalar::Int(i));
    }
    s.parse::<f64>()
        .map(Scalar::F64)
        .map_err(|e| format!("invalid bound '{s}': {e}"))
}

fn recipe_from_args(args: &RenderArgs) -> Result<Recipe, CliError> {
    let mut recipe = Recipe::new(args.field.as_deref().unwrap_or_default());
    recipe.params = serde_json::from_str(&args.params)
        .map_err(|e| CliError::input("--params JSON", e))?;

    let d = &mut recipe.domain;
    d.x0 = args.x0;
    d.x1 = args.x1;
    d.y0 = args.y0;
    d.y1 = args.y1;
    d.nx = args.mesh;
    d.ny = args.mesh;
    d.spacing = if args.log_mesh {
        AxisSpacing::Log
    } else {
        AxisSpacing::Linear
    };
    d.indexing = if args.ij { Indexing::Ij } else { Indexing::Xy };
    d.precision = args.precision.parse::<Precision>()?;
    d.size = args.size;
    d.seed = args.seed;
    d.bounds = Bounds {
        xmin: args.xmin,
        xmax: args.xmax,
        ymin: args.ymin,
        ymax: args.ymax,
    };

    let lic = &mut recipe.lic;
    lic.steps = args.steps;
    lic.step_length = args.step_length;
    lic.kernel = KernelShape::from_name(&args.kernel, args.steps)
        .map_err(|e| CliError::input("--kernel", e))?;
    lic.iterations = args.iterations;
    lic.integrator = if args.rk4 {
        Integrator::Rk4
    } else {
        Integrator::Euler
    };

    recipe.shade = args.shade.then(ShadeParams::default);
    recipe.colormap = args.colormap.clone();
    recipe.overlay = args.overlay;
    Ok(recipe)
}

fn read_recipe(path: &Path) -> Result<Recipe, CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|source| CliError::File {
            action: "read",
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_str(&text)
        .map_err(|e| CliError::input(format!("recipe {}", path.display()), e))
}

fn write_recipe(recipe: &Recipe, path: &Path) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(recipe)?;
    std::fs::write(path, text)
        .map_err(|source| CliError::File {
            action: "write",
            path: path.to_path_buf(),
            source,
        })
}

fn run_render(args: &RenderArgs, json: bool) -> Result<(), CliError> {
    let recipe = match &args.recipe {
        Some(path) => read_recipe(path)?,
        None => recipe_from_args(args)?,
    };
    recipe.validate()?;

    let opts = RenderOptions {
        colormap: Colormap::from_name(&recipe.colormap)?,
        overlay: recipe.overlay,
        ..RenderOptions::default()
    };
    let field = FieldKind::from_name(&recipe.field, &recipe.params)?;
    info!(field = %recipe.field, size = recipe.domain.size, "rendering");

    let lic = render(&field, &recipe.domain, &recipe.lic, recipe.shade.as_ref())?;
    snapshot::write_png(&lic, &opts, &args.output)?;
    if let Some(path) = &args.save_recipe {
        write_recipe(&recipe, path)?;
    }

    let size = recipe.domain.size;
    if json {
        let info = serde_json::json!({
            "field": recipe.field,
            "size": size,
            "precision": lic.precision().name(),
            "steps": recipe.lic.steps,
            "iterations": recipe.lic.iterations,
            "seed": recipe.domain.seed,
            "output": args.output.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        eprintln!(
            "rendered {} ({size}x{size}, {}, {} steps, seed {}) -> {}",
            recipe.field,
            lic.precision(),
            recipe.lic.steps,
            recipe.domain.seed,
            args.output.display()
        );
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::List => {
            let fields = FieldKind::list_fields();
            let kernels = KernelShape::list_names();
            let colormaps = Colormap::list_names();
            if cli.json {
                let info = serde_json::json!({
                    "fields": fields,
                    "kernels": kernels,
                    "colormaps": colormaps,
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("Fields:");
                for name in fields {
                    println!("  {name}");
                }
                println!("Kernels:");
                println!("  {}", kernels.join(", "));
                println!("Colormaps:");
                println!("  {}", colormaps.join(", "));
            }
        }
        Command::Render(args) => run_render(&args, cli.json)?,
    }

    Ok(())
}

/// Logs go to stderr; `RUST_LOG` overrides the default `warn` filter.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();
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
