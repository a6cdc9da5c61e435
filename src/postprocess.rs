use crate::config::Config;
use anyhow::{Context, Result};
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Cosmetic clean-up of raw OCR output. Never rejects text.
pub fn clean_text(cfg: &Config, raw: &str) -> Result<String> {
    let pp = &cfg.postprocess;
    if !pp.enabled {
        return Ok(raw.to_string());
    }

    let mut text = raw.to_string();

    if pp.normalize_newlines {
        text = text.replace("\r\n", "\n");
    }

    if pp.strip_form_feed {
        text = text.replace('\u{000C}', "");
    }

    if pp.normalize_unicode {
        text = text.nfkc().collect::<String>();
    }

    if pp.trim_trailing_whitespace {
        text = text
            .lines()
            .map(|l| l.trim_end())
            .collect::<Vec<_>>()
            .join("\n");
    }

    if pp.remove_by_regex {
        text = remove_by_regex(cfg, &text)?;
    }

    if pp.trim {
        text = text.trim().to_string();
    }

    Ok(text)
}

fn remove_by_regex(cfg: &Config, s: &str) -> Result<String> {
    let patterns = cfg
        .postprocess
        .regex
        .patterns
        .iter()
        .map(|p| Regex::new(p).with_context(|| format!("invalid postprocess regex: {p}")))
        .collect::<Result<Vec<_>>>()?;

    Ok(s.lines()
        .filter(|line| !patterns.iter().any(|re| re.is_match(line.trim())))
        .collect::<Vec<_>>()
        .join("\n"))
}
