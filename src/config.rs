use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub render: Render,
    #[serde(default)]
    pub ocr: Ocr,
    #[serde(default)]
    pub postprocess: Postprocess,
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub debug: Debug,
    #[serde(default)]
    pub security: Security,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }

    /// Rejects settings that would only fail later, mid-extraction.
    pub fn validate(&self) -> Result<()> {
        if self.layout.weekdays.is_empty() {
            anyhow::bail!("layout.weekdays is empty");
        }
        if self.layout.column_width <= 0.0 || self.layout.row_height <= 0.0 {
            anyhow::bail!(
                "layout.column_width and layout.row_height must be positive: {} / {}",
                self.layout.column_width,
                self.layout.row_height
            );
        }
        for p in &self.postprocess.regex.patterns {
            regex::Regex::new(p).with_context(|| format!("invalid postprocess regex: {p}"))?;
        }
        Ok(())
    }
}

/// Grid geometry of the menu page, measured once against the printed template.
///
/// Column `c` and row `r` address the box
/// `(column_origin + c * column_width, row_origin + r * row_height, column_width, row_height)`,
/// all as fractions of the rendered page size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layout {
    pub column_origin: f64,
    pub row_origin: f64,
    pub column_width: f64,
    pub row_height: f64,
    /// Column order, left to right. Matched case-insensitively.
    pub weekdays: Vec<String>,
}
impl Default for Layout {
    fn default() -> Self {
        Self {
            // Measured on a ~2338x1650 px render: 300, 380, 390 and 158 px.
            column_origin: 0.1283,
            row_origin: 0.2305,
            column_width: 0.1666,
            row_height: 0.0963,
            weekdays: vec![
                "montag".into(),
                "dienstag".into(),
                "mittwoch".into(),
                "donnerstag".into(),
                "freitag".into(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Render {
    pub pdftoppm_exe: String,
    pub dpi: u32,
    pub timeout_seconds: u64,
}
impl Default for Render {
    fn default() -> Self {
        Self {
            pdftoppm_exe: "pdftoppm".into(),
            dpi: 200,
            timeout_seconds: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ocr {
    pub tesseract_exe: String,
    pub lang: String,
    #[serde(default)]
    pub page_seg_mode: Option<u32>,
    pub extra_args: String,
    pub timeout_seconds: u64,
}
impl Default for Ocr {
    fn default() -> Self {
        Self {
            tesseract_exe: "tesseract".into(),
            lang: "deu".into(),
            page_seg_mode: None,
            extra_args: "".into(),
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Postprocess {
    pub enabled: bool,
    pub normalize_unicode: bool,
    pub normalize_newlines: bool,
    pub strip_form_feed: bool,
    pub trim_trailing_whitespace: bool,
    pub trim: bool,
    pub remove_by_regex: bool,
    #[serde(default)]
    pub regex: PostprocessRegex,
}
impl Default for Postprocess {
    fn default() -> Self {
        Self {
            enabled: true,
            normalize_unicode: true,
            normalize_newlines: true,
            strip_form_feed: true,
            trim_trailing_whitespace: true,
            trim: true,
            remove_by_regex: false,
            regex: Default::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostprocessRegex {
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Output {
    pub pretty_json: bool,
    pub save_crops: bool,
    /// `{day}` and `{slot}` are substituted; without them each crop overwrites the last.
    pub crop_path: String,
}
impl Default for Output {
    fn default() -> Self {
        Self {
            pretty_json: true,
            save_crops: false,
            crop_path: "crop.png".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paths {
    pub work_dir: String,
}
impl Default for Paths {
    fn default() -> Self {
        Self {
            work_dir: ".menu-crop-work".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: false,
            file_path: "".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Debug {
    pub keep_engine_stderr: bool,
    pub dump_effective_config: bool,
}
impl Default for Debug {
    fn default() -> Self {
        Self {
            keep_engine_stderr: true,
            dump_effective_config: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Security {
    pub reject_url_inputs: bool,
}
impl Default for Security {
    fn default() -> Self {
        Self {
            reject_url_inputs: true,
        }
    }
}
