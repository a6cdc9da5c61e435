use super::{process, TextRecognizer, ToolDiag};
use crate::config::Config;
use anyhow::{Context, Result};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use tracing::debug;

/// Recognizes text by piping PNG bytes through the `tesseract` CLI.
pub struct TesseractRecognizer {
    exe: String,
    lang: String,
    page_seg_mode: Option<u32>,
    extra_args: Vec<String>,
    timeout_seconds: u64,
    keep_stderr: bool,
}

impl TesseractRecognizer {
    pub fn new(cfg: &Config) -> Self {
        Self {
            exe: cfg.ocr.tesseract_exe.clone(),
            lang: cfg.ocr.lang.clone(),
            page_seg_mode: cfg.ocr.page_seg_mode,
            extra_args: cfg
                .ocr
                .extra_args
                .split_whitespace()
                .map(str::to_string)
                .collect(),
            timeout_seconds: cfg.ocr.timeout_seconds,
            keep_stderr: cfg.debug.keep_engine_stderr,
        }
    }

    pub fn args(&self) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "stdin".into(),
            "stdout".into(),
            "-l".into(),
            self.lang.clone(),
        ];
        if let Some(psm) = self.page_seg_mode {
            args.push("--psm".into());
            args.push(psm.to_string());
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, region: &DynamicImage) -> Result<String> {
        if region.width() == 0 || region.height() == 0 {
            debug!("empty region, skipping OCR");
            return Ok(String::new());
        }

        let mut png = Vec::new();
        region
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .with_context(|| "encoding region as PNG")?;

        let out = process::run_tool(
            &self.exe,
            self.args().as_slice(),
            Some(png.as_slice()),
            self.timeout_seconds,
            self.keep_stderr,
        )?;
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }

    fn doctor(&self) -> Result<ToolDiag> {
        let version = match process::run_tool(&self.exe, &["--version"], None, 30, false) {
            Ok(out) => process::first_line(&out),
            Err(e) => {
                return Ok(ToolDiag::failed(
                    "tesseract",
                    &self.exe,
                    format!("{e:#}; install tesseract-ocr"),
                ));
            }
        };

        let out = process::run_tool(&self.exe, &["--list-langs"], None, 30, false)?;
        let languages = parse_list_langs(&String::from_utf8_lossy(&out.stdout));
        let ok = languages.iter().any(|l| l == &self.lang);

        Ok(ToolDiag {
            tool: "tesseract".into(),
            exe: self.exe.clone(),
            version,
            ok,
            error: (!ok).then(|| format!("language model '{}' is not installed", self.lang)),
            languages,
        })
    }
}

/// `--list-langs` prints a header line followed by one language per line.
pub fn parse_list_langs(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with("List of available languages"))
        .map(str::to_string)
        .collect()
}
