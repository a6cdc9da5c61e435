use crate::{config::Config, util::ensure_dir};
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt, EnvFilter, Layer,
};

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

/// Installs the global subscriber. `RUST_LOG` wins over `level_override`, which
/// wins over `logging.level`. Keep the returned guard alive to flush the log file.
pub fn init(cfg: &Config, level_override: Option<&str>) -> Result<Option<WorkerGuard>> {
    let level = level_override.unwrap_or(&cfg.logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard) = match log_file(cfg) {
        Some(path) => {
            let (layer, guard) = file_layer(&path)?;
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer(cfg.logging.json))
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

pub fn log_file(cfg: &Config) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }
    if cfg.logging.file_path.is_empty() {
        return Some(Path::new(&cfg.paths.work_dir).join("menu-crop.log"));
    }
    Some(PathBuf::from(&cfg.logging.file_path))
}

// stdout carries command output, so console logs go to stderr.
fn stderr_layer<S>(json: bool) -> BoxedLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let fmt = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);
    if json { fmt.json().boxed() } else { fmt.boxed() }
}

fn file_layer<S>(path: &Path) -> Result<(BoxedLayer<S>, WorkerGuard)>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }
    let file = std::fs::File::create(path)
        .with_context(|| format!("create log file: {}", path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(file);
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .boxed();
    Ok((layer, guard))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_defaults_into_work_dir() {
        let mut cfg = Config::default();
        assert_eq!(log_file(&cfg), None);

        cfg.logging.write_to_file = true;
        assert_eq!(
            log_file(&cfg),
            Some(Path::new(".menu-crop-work").join("menu-crop.log"))
        );

        cfg.logging.file_path = "logs/run.log".into();
        assert_eq!(log_file(&cfg), Some(PathBuf::from("logs/run.log")));
    }
}
