use anyhow::{anyhow, Result};
use image::{DynamicImage, GenericImageView, ImageBuffer, Rgb, RgbImage};
use menu_crop::{
    config::Config,
    engine::{PageRenderer, TextRecognizer, ToolDiag},
    error::MenuError,
    layout::MealSlot,
    pipeline::MealExtractor,
};
use serde_json::json;
use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;

const PAGE: u32 = 1000;

/// Paints every (column, row) cell of the default grid with a color encoding its position.
fn synthetic_page(cfg: &Config) -> DynamicImage {
    let l = &cfg.layout;
    let img: RgbImage = ImageBuffer::from_fn(PAGE, PAGE, |x, y| {
        let fx = x as f64 / PAGE as f64;
        let fy = y as f64 / PAGE as f64;
        let col = ((fx - l.column_origin) / l.column_width).floor();
        let row = ((fy - l.row_origin) / l.row_height).floor();
        if (0.0..5.0).contains(&col) && (0.0..4.0).contains(&row) {
            Rgb([10 + 40 * col as u8, 10 + 40 * row as u8, 255])
        } else {
            Rgb([255, 255, 255])
        }
    });
    DynamicImage::ImageRgb8(img)
}

struct FakeRenderer {
    page: DynamicImage,
    calls: Rc<Cell<usize>>,
}

impl FakeRenderer {
    fn new(page: DynamicImage) -> Self {
        Self {
            page,
            calls: Rc::new(Cell::new(0)),
        }
    }
}

impl PageRenderer for FakeRenderer {
    fn render_first_page(&self, _document: &Path) -> Result<DynamicImage> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.page.clone())
    }

    fn doctor(&self) -> Result<ToolDiag> {
        Err(anyhow!("not a real tool"))
    }
}

struct BrokenRenderer;

impl PageRenderer for BrokenRenderer {
    fn render_first_page(&self, document: &Path) -> Result<DynamicImage> {
        Err(anyhow!("cannot open {}", document.display()))
    }

    fn doctor(&self) -> Result<ToolDiag> {
        Err(anyhow!("not a real tool"))
    }
}

/// "Reads" the cell color at the center of the crop.
struct ColorReader;

impl TextRecognizer for ColorReader {
    fn recognize(&self, region: &DynamicImage) -> Result<String> {
        if region.width() == 0 || region.height() == 0 {
            return Ok(String::new());
        }
        let [r, g, b, _] = region
            .get_pixel(region.width() / 2, region.height() / 2)
            .0;
        if b != 255 || r == 255 {
            return Ok(String::new());
        }
        Ok(format!("col{} row{}\u{000C}\n", (r - 10) / 40, (g - 10) / 40))
    }

    fn doctor(&self) -> Result<ToolDiag> {
        Err(anyhow!("not a real tool"))
    }
}

struct FailingReader;

impl TextRecognizer for FailingReader {
    fn recognize(&self, _region: &DynamicImage) -> Result<String> {
        Err(anyhow!("tesseract exited with status 1"))
    }

    fn doctor(&self) -> Result<ToolDiag> {
        Err(anyhow!("not a real tool"))
    }
}

fn extractor(cfg: &Config) -> MealExtractor<FakeRenderer, ColorReader> {
    MealExtractor::new(cfg, FakeRenderer::new(synthetic_page(cfg)), ColorReader)
}

#[test]
fn monday_reads_column_zero_top_to_bottom() {
    let cfg = Config::default();
    let meals = extractor(&cfg)
        .get_meals(Path::new("menu.pdf"), "Montag")
        .unwrap();

    assert_eq!(meals.date, "col0 row0");
    assert_eq!(meals.light_meal, "col0 row1");
    assert_eq!(meals.menu_one, "col0 row2");
    assert_eq!(meals.menu_two, "col0 row3");
}

#[test]
fn each_weekday_reads_its_own_column() {
    let cfg = Config::default();
    let ex = extractor(&cfg);
    for (col, day) in ["montag", "DIENSTAG", "Mittwoch", "donnerstag", "Freitag"]
        .iter()
        .enumerate()
    {
        let meals = ex.get_meals(Path::new("menu.pdf"), day).unwrap();
        for (slot, text) in meals.iter() {
            assert_eq!(text, format!("col{} row{}", col, slot.row()));
        }
    }
}

#[test]
fn result_serializes_with_menu_labels() {
    let cfg = Config::default();
    let meals = extractor(&cfg)
        .get_meals(Path::new("menu.pdf"), "freitag")
        .unwrap();
    let v = serde_json::to_value(&meals).unwrap();
    let keys: Vec<&str> = v.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys.len(), 4);
    for slot in MealSlot::ALL {
        assert_eq!(v[slot.label()], json!(meals.get(slot)));
    }
}

#[test]
fn non_string_day_is_rejected_before_rendering() {
    let cfg = Config::default();
    let renderer = FakeRenderer::new(synthetic_page(&cfg));
    let calls = renderer.calls.clone();
    let ex = MealExtractor::new(&cfg, renderer, ColorReader);

    for day in [json!(3), json!(null)] {
        let err = ex
            .get_meals_value(Path::new("menu.pdf"), &day)
            .unwrap_err();
        assert!(matches!(err, MenuError::InvalidInput(_)));
    }
    assert_eq!(calls.get(), 0);

    let meals = ex
        .get_meals_value(Path::new("menu.pdf"), &json!("Dienstag"))
        .unwrap();
    assert_eq!(meals.date, "col1 row0");
    assert_eq!(calls.get(), 1);
}

#[test]
fn unknown_day_is_rejected() {
    let cfg = Config::default();
    let err = extractor(&cfg)
        .get_meals(Path::new("menu.pdf"), "Sonntag")
        .unwrap_err();
    assert!(matches!(err, MenuError::UnrecognizedWeekday(ref d) if d == "Sonntag"));
}

#[test]
fn render_and_ocr_failures_propagate() {
    let cfg = Config::default();

    let ex = MealExtractor::new(&cfg, BrokenRenderer, ColorReader);
    let err = ex.get_meals(Path::new("missing.pdf"), "Montag").unwrap_err();
    assert!(matches!(err, MenuError::Render(_)));
    assert!(err.to_string().contains("missing.pdf"));

    let ex = MealExtractor::new(&cfg, FakeRenderer::new(synthetic_page(&cfg)), FailingReader);
    let err = ex.get_meals(Path::new("menu.pdf"), "Montag").unwrap_err();
    assert!(matches!(err, MenuError::Ocr(_)));
    assert!(!err.is_input_error());
}

#[test]
fn repeated_extractions_use_identical_pixel_bounds() {
    let cfg = Config::default();
    let ex = extractor(&cfg);
    let a = ex.extract(Path::new("menu.pdf"), "Mittwoch").unwrap();
    let b = ex.extract(Path::new("menu.pdf"), "Mittwoch").unwrap();

    assert_eq!(a.column, 2);
    assert_eq!(a.page.width, PAGE);
    assert_eq!(a.regions, b.regions);
    assert_eq!(a.regions.len(), 4);
    assert_eq!(a.regions[0].pixels.x, 461);
    assert_eq!(a.regions[0].pixels.y, 230);
    assert_eq!(a.regions[0].pixels.width, 166);
    assert_eq!(a.regions[0].pixels.height, 96);
}

#[test]
fn week_renders_once() {
    let cfg = Config::default();
    let renderer = FakeRenderer::new(synthetic_page(&cfg));
    let calls = renderer.calls.clone();
    let ex = MealExtractor::new(&cfg, renderer, ColorReader);
    let week = ex.get_week(Path::new("menu.pdf")).unwrap();

    assert_eq!(calls.get(), 1);

    assert_eq!(week.len(), 5);
    assert_eq!(week[0].day, "montag");
    assert_eq!(week[4].day, "freitag");
    assert_eq!(week[3].meals.menu_two, "col3 row3");
}

#[test]
fn raw_text_is_kept_when_postprocess_is_off() {
    let mut cfg = Config::default();
    cfg.postprocess.enabled = false;
    let meals = extractor(&cfg)
        .get_meals(Path::new("menu.pdf"), "Montag")
        .unwrap();
    assert_eq!(meals.date, "col0 row0\u{000C}\n");
}

#[test]
fn crops_are_saved_per_day_and_slot() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = Config::default();
    cfg.output.save_crops = true;
    cfg.output.crop_path = dir
        .path()
        .join("{day}-{slot}.png")
        .display()
        .to_string();

    extractor(&cfg)
        .get_meals(Path::new("menu.pdf"), "Donnerstag")
        .unwrap();

    for slot in MealSlot::ALL {
        let path = dir.path().join(format!("donnerstag-{}.png", slot.label()));
        let img = image::open(&path).unwrap();
        assert_eq!(img.dimensions(), (166, 96));
    }
}

#[test]
fn off_page_crops_are_not_saved() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = Config::default();
    cfg.layout.column_origin = 1.2;
    cfg.output.save_crops = true;
    cfg.output.crop_path = dir
        .path()
        .join("{day}-{slot}.png")
        .display()
        .to_string();

    let meals = extractor(&cfg)
        .get_meals(Path::new("menu.pdf"), "Montag")
        .unwrap();

    for (_, text) in meals.iter() {
        assert_eq!(text, "");
    }
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn configured_weekday_name_is_reported_and_used_for_crops() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = Config::default();
    cfg.output.save_crops = true;
    cfg.output.crop_path = dir
        .path()
        .join("{day}-{slot}.png")
        .display()
        .to_string();

    let extraction = extractor(&cfg)
        .extract(Path::new("menu.pdf"), " MONTAG ")
        .unwrap();

    assert_eq!(extraction.day, "montag");
    assert_eq!(extraction.meals.date, "col0 row0");
    assert!(dir.path().join("montag-Datum.png").exists());
    assert!(!dir.path().join(" montag -Datum.png").exists());
}
