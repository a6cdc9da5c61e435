use super::{process, PageRenderer, ToolDiag};
use crate::{config::Config, util::ensure_dir};
use anyhow::{anyhow, Context, Result};
use image::DynamicImage;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Renders through poppler's `pdftoppm`.
pub struct PopplerRenderer {
    exe: String,
    dpi: u32,
    timeout_seconds: u64,
    work_dir: PathBuf,
    keep_stderr: bool,
}

impl PopplerRenderer {
    pub fn new(cfg: &Config) -> Self {
        Self {
            exe: cfg.render.pdftoppm_exe.clone(),
            dpi: cfg.render.dpi,
            timeout_seconds: cfg.render.timeout_seconds,
            work_dir: PathBuf::from(&cfg.paths.work_dir),
            keep_stderr: cfg.debug.keep_engine_stderr,
        }
    }

    /// Paths go last and absolute, so a name starting with `-` can't pass for a flag.
    pub fn args(&self, document: &Path, prefix: &Path) -> Result<Vec<OsString>> {
        let mut args: Vec<OsString> = ["-png", "-f", "1", "-l", "1", "-singlefile"]
            .into_iter()
            .map(OsString::from)
            .collect();
        if self.dpi > 0 {
            args.push("-r".into());
            args.push(self.dpi.to_string().into());
        }
        for path in [document, prefix] {
            let abs = std::path::absolute(path)
                .with_context(|| format!("resolving {}", path.display()))?;
            args.push(abs.into_os_string());
        }
        Ok(args)
    }
}

impl PageRenderer for PopplerRenderer {
    fn render_first_page(&self, document: &Path) -> Result<DynamicImage> {
        if !document.exists() {
            return Err(anyhow!("document does not exist: {}", document.display()));
        }
        ensure_dir(&self.work_dir)?;
        let scratch = tempfile::Builder::new()
            .prefix("render-")
            .tempdir_in(&self.work_dir)
            .with_context(|| format!("creating scratch dir in {}", self.work_dir.display()))?;
        let prefix = scratch.path().join("page");

        info!("render page 1 of {} dpi={}", document.display(), self.dpi);
        process::run_tool(
            &self.exe,
            self.args(document, &prefix)?.as_slice(),
            None,
            self.timeout_seconds,
            self.keep_stderr,
        )?;

        let png = prefix.with_extension("png");
        let page = image::open(&png)
            .with_context(|| format!("decoding rendered page: {}", png.display()))?;
        debug!("rendered page {}x{}", page.width(), page.height());
        Ok(page)
    }

    fn doctor(&self) -> Result<ToolDiag> {
        // `pdftoppm -v` prints to stderr and exits non-zero on some poppler releases.
        match process::run_tool_unchecked(&self.exe, &["-v"], None, 30) {
            Ok(out) => Ok(ToolDiag {
                tool: "pdftoppm".into(),
                exe: self.exe.clone(),
                version: process::first_line(&out),
                ok: true,
                languages: Vec::new(),
                error: None,
            }),
            Err(e) => Ok(ToolDiag::failed(
                "pdftoppm",
                &self.exe,
                format!("{e:#}; install poppler-utils"),
            )),
        }
    }
}
