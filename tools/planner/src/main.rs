//! `stx-plan`: 根据颅骨扫描表计算立体定向入口和植入长度.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use log::LevelFilter;
use stereo_berry::consts::{DEFAULT_REFERENCE, TEMPLATE_200UM};
use stereo_berry::dataset;
use stereo_berry::prelude::*;

mod result;
mod runner;

use result::PlanReport;
use runner::{PlanRequest, Renderer};

/// 角度约定.
#[derive(Copy, Clone, Debug, ValueEnum)]
enum Convention {
    /// Relative to the inferosuperior axis
    Stereotaxic,
    /// Relative to the posteroanterior axis
    Posteroanterior,
}

impl From<Convention> for AngleConvention {
    fn from(c: Convention) -> Self {
        match c {
            Convention::Stereotaxic => AngleConvention::Stereotaxic,
            Convention::Posteroanterior => AngleConvention::Posteroanterior,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "stx-plan")]
#[command(author, version, about = "Stereotactic entry point and implant length from skull sweeps")]
struct Args {
    /// Skull sweep CSV files
    sweeps: Vec<PathBuf>,

    /// Animal IDs to load as `skull_{id}.csv` from the data directory, e.g. `6465,6470-6472`
    #[arg(long)]
    ids: Option<String>,

    /// Directory holding `skull_{id}.csv` files [default: $STX_DATA_DIR or ~/data/stereotactic]
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Target row ID, or `pa,is[,lr]` coordinates (inferosuperior pointing up)
    #[arg(short, long, default_value = "VTA")]
    target: String,

    /// Insertion angle in degrees
    #[arg(short, long, default_value = "0", allow_negative_numbers = true)]
    angle: f64,

    /// How the insertion angle is measured
    #[arg(long, value_enum, default_value = "stereotaxic")]
    convention: Convention,

    /// Use the sweep's `incision` row as entry point instead of projecting along the angle
    #[arg(long)]
    incision: bool,

    /// Ultimate reference point
    #[arg(short, long, default_value = DEFAULT_REFERENCE)]
    reference: String,

    /// Save a sagittal plot (PNG); `{id}` is replaced by the sweep name
    #[arg(long)]
    png: Option<PathBuf>,

    /// Save a template overlay (PNG); `{id}` is replaced by the sweep name
    #[arg(long)]
    overlay: Option<PathBuf>,

    /// Overlay background template [default: $STX_TEMPLATE or ~/ni_data/templates/DSURQEc_40micron_average.nii]
    #[arg(long)]
    template: Option<PathBuf>,

    /// Save the skull points as a NIfTI mask; `{id}` is replaced by the sweep name
    #[arg(long)]
    mask: Option<PathBuf>,

    /// Reference template for the mask [default: ~/ni_data/templates/DSURQEc_200micron_average.nii]
    #[arg(long)]
    mask_template: Option<PathBuf>,

    /// Also write the report, with trajectories and resolved points, as JSON
    #[arg(long)]
    json: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv); `RUST_LOG` overrides it
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// 解析 `pa,is` 或 `pa,is,lr` 形式的坐标, 其余情况视为行 ID.
fn parse_target(s: &str) -> Result<Target> {
    let values: std::result::Result<Vec<f64>, _> =
        s.split(',').map(|v| v.trim().parse::<f64>()).collect();
    match values.as_deref() {
        Ok(&[pa, is]) => Ok(StereoPoint::sagittal(pa, is).into()),
        Ok(&[pa, is, lr]) => Ok(StereoPoint::new(pa, is, lr).into()),
        Ok(_) => bail!("target coordinates must be `pa,is` or `pa,is,lr`, got `{s}`"),
        Err(_) => Ok(Target::from(s)),
    }
}

/// 由命令行参数构建渲染设置. 未给出的模板路径取自环境变量或主目录.
fn build_renderer(args: &Args) -> Renderer {
    let mut r = Renderer::new();
    r.png = args.png.clone();
    r.overlay = args.overlay.clone();
    r.template = args
        .template
        .clone()
        .or_else(utils::loader::template_from_env_or_home);
    r.mask = args.mask.clone();
    r.mask_template = args
        .mask_template
        .clone()
        .or_else(|| dataset::home_template_dir().map(|d| d.join(TEMPLATE_200UM)));
    r
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    simple_logger::SimpleLogger::new()
        .with_level(level)
        .env()
        .init()?;

    let request = PlanRequest {
        target: parse_target(&args.target)?,
        angle: if args.incision {
            None
        } else {
            Some(InsertionAngle::new(args.angle, args.convention.into())?)
        },
        reference: args.reference.clone(),
    };

    // (名称, 数据) 对.
    let mut sources: Vec<(String, stereo_berry::Result<SkullSweep>)> = args
        .sweeps
        .iter()
        .map(|p| {
            let name = p
                .file_stem()
                .map_or_else(|| p.display().to_string(), |s| s.to_string_lossy().into_owned());
            (name, SkullSweep::open(p))
        })
        .collect();
    if let Some(ids) = &args.ids {
        let Some(ids) = utils::parse_ids(ids) else {
            bail!("malformed id list `{ids}`");
        };
        let loader = match &args.data_dir {
            Some(d) => utils::loader::skull_loader(ids, d),
            None => match utils::loader::skull_loader_from_env_or_home(ids) {
                Some(l) => l,
                None => bail!("cannot locate the data directory; pass --data-dir"),
            },
        };
        sources.extend(loader.map(|(id, sweep)| (id.to_string(), sweep)));
    }
    if sources.is_empty() {
        bail!("no skull sweep given; pass CSV files or --ids");
    }

    let mut renderer = build_renderer(&args);
    if sources.len() > 1 && renderer.is_active() && !renderer.is_per_sweep() {
        log::warn!("output paths without `{{id}}` will be overwritten by each sweep");
    }

    let mut report = PlanReport::default();
    for (name, sweep) in sources {
        log::info!("planning sweep `{name}`");
        let planned = sweep.and_then(|s| runner::plan(&s, &request));
        match planned {
            Ok(planned) => {
                let output = renderer.render(&planned, &name);
                if let Err(e) = &output {
                    log::error!("sweep `{name}`: {e:#}");
                }
                report.push_planned(name, planned, output);
            }
            Err(e) => {
                log::error!("sweep `{name}`: {e}");
                report.push_failed(name, e);
            }
        }
    }
    report.analyze()?;
    if let Some(path) = &args.json {
        report.save_json(path)?;
    }

    match report.failures() {
        0 => Ok(()),
        n => bail!("{n} of {} sweeps failed", report.len()),
    }
}
