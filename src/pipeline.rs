use crate::{
    config::Config,
    crop::{crop, crop_path, save_crop},
    engine::{PageRenderer, TextRecognizer},
    error::MenuError,
    layout::{weekday_str, MealSlot},
    postprocess,
    report::{DayMeals, Extraction, MealResult, PageSize, RegionReport},
};
use image::DynamicImage;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Render page 1, crop the weekday's four cells, OCR each one.
pub struct MealExtractor<R: PageRenderer, O: TextRecognizer> {
    cfg: Config,
    renderer: R,
    recognizer: O,
}

impl<R: PageRenderer, O: TextRecognizer> MealExtractor<R, O> {
    pub fn new(cfg: &Config, renderer: R, recognizer: O) -> Self {
        Self {
            cfg: cfg.clone(),
            renderer,
            recognizer,
        }
    }

    pub fn get_meals(&self, document: &Path, day: &str) -> Result<MealResult, MenuError> {
        Ok(self.extract(document, day)?.meals)
    }

    /// For weekdays that come from loosely typed input; anything but a string is
    /// rejected before the document is touched.
    pub fn get_meals_value(&self, document: &Path, day: &Value) -> Result<MealResult, MenuError> {
        let day = weekday_str(day)?;
        self.get_meals(document, day)
    }

    pub fn extract(&self, document: &Path, day: &str) -> Result<Extraction, MenuError> {
        let column = self.cfg.layout.resolve(day)?;
        let page = self.render(document)?;
        self.extract_column(&page, &self.cfg.layout.weekdays[column], column)
    }

    /// Every configured weekday from a single render, in column order.
    pub fn get_week(&self, document: &Path) -> Result<Vec<DayMeals>, MenuError> {
        let page = self.render(document)?;
        let mut week = Vec::with_capacity(self.cfg.layout.weekdays.len());
        for (column, day) in self.cfg.layout.weekdays.iter().enumerate() {
            let extraction = self.extract_column(&page, day, column)?;
            week.push(DayMeals {
                day: day.clone(),
                meals: extraction.meals,
            });
        }
        Ok(week)
    }

    fn render(&self, document: &Path) -> Result<DynamicImage, MenuError> {
        let page = self
            .renderer
            .render_first_page(document)
            .map_err(MenuError::Render)?;
        info!(
            "page {} rendered at {}x{}",
            document.display(),
            page.width(),
            page.height()
        );
        Ok(page)
    }

    fn extract_column(
        &self,
        page: &DynamicImage,
        day: &str,
        column: usize,
    ) -> Result<Extraction, MenuError> {
        let mut meals = MealResult::default();
        let mut regions = Vec::with_capacity(MealSlot::ALL.len());

        for slot in MealSlot::ALL {
            let bx = self.cfg.layout.box_for(column, slot);
            let pixels = bx.to_pixels(page.width(), page.height());
            let region = crop(page, &bx);

            if self.cfg.output.save_crops {
                let path = PathBuf::from(crop_path(&self.cfg.output.crop_path, day, slot.label()));
                if region.width() == 0 || region.height() == 0 {
                    warn!("{day}/{slot} crop is empty, not saving {}", path.display());
                } else {
                    save_crop(&region, &path)?;
                }
            }

            let raw = self.recognizer.recognize(&region).map_err(MenuError::Ocr)?;
            let text = postprocess::clean_text(&self.cfg, &raw).map_err(MenuError::Ocr)?;
            debug!("{day}/{slot}: {} chars", text.chars().count());

            meals.set(slot, text);
            regions.push(RegionReport {
                slot,
                normalized: bx,
                pixels,
            });
        }

        Ok(Extraction {
            day: day.to_string(),
            column,
            page: PageSize {
                width: page.width(),
                height: page.height(),
            },
            regions,
            meals,
        })
    }
}
