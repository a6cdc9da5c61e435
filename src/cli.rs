use crate::{
    batch::{parse_requests, run_batch},
    config::Config,
    crop::{crop, save_crop},
    engine::{
        poppler::PopplerRenderer, tesseract::TesseractRecognizer, PageRenderer, TextRecognizer,
    },
    layout::{MealSlot, NormalizedBox},
    logging,
    pipeline::MealExtractor,
    report::RunReport,
    util::{ensure_dir, hash_file, now_rfc3339},
};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "menu-crop")]
#[command(about = "Extract daily cafeteria menu text from a fixed-layout PDF scan")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./menu-crop.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check that pdftoppm and tesseract (with the configured language) are usable.
    Doctor {},
    /// Print the crop boxes of the layout table.
    Layout {
        #[arg(long)]
        day: Option<String>,
    },
    /// Render page 1 of a PDF to PNG, for measuring the layout.
    Render {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
    /// Crop an image with an explicit box `x,y,width,height` (fractions).
    Crop {
        #[arg(long)]
        input: PathBuf,
        #[arg(long = "box")]
        bx: NormalizedBox,
        #[arg(long)]
        out: PathBuf,
    },
    /// Extract one weekday's meals.
    Meals {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        day: String,
        #[arg(long)]
        save_crops: bool,
        /// Also write a JSON run report with the pixel bounds of every crop.
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Extract every weekday from a single render.
    Week {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        save_crops: bool,
    },
    /// Run a JSON array of `{"input": ..., "day": ...}` requests.
    Batch {
        #[arg(long)]
        requests: PathBuf,
    },
}

pub fn dispatch(args: Args) -> Result<()> {
    let mut cfg = match resolve_config_path(args.config.as_deref()) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };

    let _guard = logging::init(&cfg, args.log_level.as_deref())?;

    cfg.validate()?;
    if cfg.layout.check() > 0 {
        warn!("some layout boxes leave the page; their crops will be clipped");
    }

    if cfg.debug.dump_effective_config {
        let raw = toml::to_string(&cfg).unwrap_or_default();
        ensure_dir(Path::new(&cfg.paths.work_dir))?;
        std::fs::write(Path::new(&cfg.paths.work_dir).join("effective-config.toml"), raw)?;
    }

    match &args.cmd {
        Command::Doctor {} => doctor(&cfg),
        Command::Layout { day } => layout(&cfg, day.as_deref()),
        Command::Render { input, out } => render(&cfg, input, out),
        Command::Crop { input, bx, out } => crop_image(input, bx, out),
        Command::Meals {
            input,
            day,
            save_crops,
            report,
        } => {
            cfg.output.save_crops |= *save_crops;
            meals(&cfg, input, day, report.as_deref())
        }
        Command::Week { input, save_crops } => {
            cfg.output.save_crops |= *save_crops;
            week(&cfg, input)
        }
        Command::Batch { requests } => batch(&cfg, requests),
    }
}

fn resolve_config_path(user: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = user {
        return Some(p.to_path_buf());
    }
    ["menu-crop.toml", "menu-crop.example.toml"]
        .into_iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}

fn print_json<T: Serialize>(cfg: &Config, value: &T) -> Result<()> {
    let out = if cfg.output.pretty_json {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{out}");
    Ok(())
}

fn doctor(cfg: &Config) -> Result<()> {
    let renderer = PopplerRenderer::new(cfg).doctor()?;
    let recognizer = TesseractRecognizer::new(cfg).doctor()?;
    let ok = renderer.ok && recognizer.ok;
    print_json(
        cfg,
        &serde_json::json!({
            "ok": ok,
            "renderer": renderer,
            "recognizer": recognizer,
        }),
    )?;
    if !ok {
        return Err(anyhow!("doctor found problems"));
    }
    Ok(())
}

#[derive(Serialize)]
struct LayoutRow<'a> {
    day: &'a str,
    column: usize,
    slot: MealSlot,
    label: &'static str,
    #[serde(rename = "box")]
    bx: NormalizedBox,
    fits_page: bool,
}

fn layout(cfg: &Config, day: Option<&str>) -> Result<()> {
    let columns: Vec<(usize, &str)> = match day {
        Some(d) => {
            let column = cfg.layout.resolve(d)?;
            vec![(column, cfg.layout.weekdays[column].as_str())]
        }
        None => cfg
            .layout
            .weekdays
            .iter()
            .enumerate()
            .map(|(i, d)| (i, d.as_str()))
            .collect(),
    };

    let rows: Vec<LayoutRow> = columns
        .into_iter()
        .flat_map(move |(column, day)| {
            MealSlot::ALL.into_iter().map(move |slot| {
                let bx = cfg.layout.box_for(column, slot);
                LayoutRow {
                    day,
                    column,
                    slot,
                    label: slot.label(),
                    bx,
                    fits_page: bx.fits_page(),
                }
            })
        })
        .collect();

    print_json(cfg, &rows)
}

fn render(cfg: &Config, input: &Path, out: &Path) -> Result<()> {
    validate_input(cfg, input)?;
    let page = PopplerRenderer::new(cfg).render_first_page(input)?;
    save_crop(&page, out)?;
    info!("wrote {}x{} page to {}", page.width(), page.height(), out.display());
    Ok(())
}

fn crop_image(input: &Path, bx: &NormalizedBox, out: &Path) -> Result<()> {
    let image = image::open(input).with_context(|| format!("open image: {}", input.display()))?;
    if !bx.fits_page() {
        warn!("box leaves the image and will be clipped: {bx:?}");
    }
    let region = crop(&image, bx);
    save_crop(&region, out)?;
    info!(
        "wrote {}x{} crop to {}",
        region.width(),
        region.height(),
        out.display()
    );
    Ok(())
}

fn extractor(cfg: &Config) -> MealExtractor<PopplerRenderer, TesseractRecognizer> {
    MealExtractor::new(cfg, PopplerRenderer::new(cfg), TesseractRecognizer::new(cfg))
}

fn meals(cfg: &Config, input: &Path, day: &str, report: Option<&Path>) -> Result<()> {
    validate_input(cfg, input)?;
    let started = now_rfc3339();
    let extraction = extractor(cfg).extract(input, day)?;

    if let Some(report_path) = report {
        let report = RunReport {
            input: input.display().to_string(),
            input_sha256: hash_file(input)
                .with_context(|| format!("hashing input: {}", input.display()))?,
            started,
            finished: now_rfc3339(),
            extraction: extraction.clone(),
        };
        if let Some(parent) = report_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_dir(parent)?;
        }
        std::fs::write(report_path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("writing report: {}", report_path.display()))?;
        info!("report written to {}", report_path.display());
    }

    print_json(cfg, &extraction.meals)
}

fn week(cfg: &Config, input: &Path) -> Result<()> {
    validate_input(cfg, input)?;
    let week = extractor(cfg).get_week(input)?;
    print_json(cfg, &week)
}

fn batch(cfg: &Config, requests: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(requests)
        .with_context(|| format!("reading requests: {}", requests.display()))?;
    let requests = parse_requests(&raw)?;
    for req in &requests {
        validate_input(cfg, &req.input)?;
    }
    let entries = run_batch(&extractor(cfg), requests)?;
    print_json(cfg, &entries)
}

fn validate_input(cfg: &Config, input: &Path) -> Result<()> {
    let input_str = input.display().to_string();

    if cfg.security.reject_url_inputs && looks_like_url(&input_str) {
        return Err(anyhow!("URL inputs are disabled: {input_str}"));
    }

    if !input.exists() {
        return Err(anyhow!("input does not exist: {}", input.display()));
    }

    if let Some(ext) = input.extension().and_then(|s| s.to_str()) {
        if !ext.eq_ignore_ascii_case("pdf") {
            return Err(anyhow!("input is not a PDF: {}", input.display()));
        }
    } else {
        warn!("input has no extension; assuming PDF: {}", input.display());
    }

    Ok(())
}

fn looks_like_url(s: &str) -> bool {
    let s = s.to_ascii_lowercase();
    s.starts_with("http://") || s.starts_with("https://") || s.starts_with("file://")
}
