use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "warpstack", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply a filter JSON (bulges + overlays) to an image.
    Apply(ApplyArgs),
    /// Apply a single bulge to an image.
    Bulge(BulgeArgs),
}

#[derive(Parser, Debug)]
struct ApplyArgs {
    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Filter JSON. Overlay sources are resolved relative to its directory.
    #[arg(long)]
    filter: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Split distortion rows across threads.
    #[arg(long)]
    parallel: bool,
}

#[derive(Parser, Debug)]
struct BulgeArgs {
    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Normalized center as `x,y`.
    #[arg(long, value_parser = parse_point, default_value = "0.5,0.5")]
    center: warpstack::Point,

    /// Normalized radius.
    #[arg(long, default_value_t = warpstack::BulgeParams::DEFAULT_RADIUS)]
    radius: f64,

    /// Strength; negative values pinch.
    #[arg(long, default_value_t = warpstack::BulgeParams::DEFAULT_SCALE, allow_hyphen_values = true)]
    scale: f64,

    /// Reconstruction filter.
    #[arg(long, value_enum, default_value_t = FilterChoice::Bilinear)]
    filter: FilterChoice,

    /// Split distortion rows across threads.
    #[arg(long)]
    parallel: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FilterChoice {
    Bilinear,
    Nearest,
}

impl From<FilterChoice> for warpstack::SampleFilter {
    fn from(v: FilterChoice) -> Self {
        match v {
            FilterChoice::Bilinear => Self::Bilinear,
            FilterChoice::Nearest => Self::Nearest,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Apply(args) => cmd_apply(args),
        Command::Bulge(args) => cmd_bulge(args),
    }
}

fn parse_point(s: &str) -> Result<warpstack::Point, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got '{s}'"))?;
    let x: f64 = x.trim().parse().map_err(|e| format!("bad x '{x}': {e}"))?;
    let y: f64 = y.trim().parse().map_err(|e| format!("bad y '{y}': {e}"))?;
    Ok(warpstack::Point::new(x, y))
}

fn make_engine(parallel: bool) -> warpstack::CpuEngine {
    warpstack::CpuEngine::new(warpstack::CpuEngineOpts {
        parallel,
        ..warpstack::CpuEngineOpts::default()
    })
}

fn cmd_apply(args: ApplyArgs) -> anyhow::Result<()> {
    let spec = warpstack::FilterSpec::from_path(&args.filter)
        .with_context(|| format!("load filter '{}'", args.filter.display()))?;

    let assets_root = args.filter.parent().unwrap_or_else(|| Path::new("."));
    let comp = spec.build(assets_root)?;

    let input = warpstack::load_image(&args.in_path)?;
    let mut engine = make_engine(args.parallel);
    let out = comp.render(&mut engine, &input)?;

    warpstack::save_png(&out, &args.out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_bulge(args: BulgeArgs) -> anyhow::Result<()> {
    let mut comp = warpstack::Compositor::new(warpstack::CompositorSettings {
        filter: args.filter.into(),
        ..warpstack::CompositorSettings::default()
    });
    comp.regions_mut()
        .add(warpstack::BulgeParams::new(args.center, args.radius, args.scale));

    let input = warpstack::load_image(&args.in_path)?;
    let mut engine = make_engine(args.parallel);
    let out = comp.render(&mut engine, &input)?;

    warpstack::save_png(&out, &args.out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}
