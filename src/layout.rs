use crate::{config::Layout, error::MenuError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// A rectangle as fractions of the page width/height; `(x, y)` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A [`NormalizedBox`] resolved against a concrete image size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl NormalizedBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Truncates each scaled coordinate to whole pixels. No clamping happens here;
    /// the crop itself clips to the image.
    pub fn to_pixels(&self, image_width: u32, image_height: u32) -> PixelRect {
        let w = image_width as f64;
        let h = image_height as f64;
        PixelRect {
            x: (self.x * w) as u32,
            y: (self.y * h) as u32,
            width: (self.width * w) as u32,
            height: (self.height * h) as u32,
        }
    }

    pub fn fits_page(&self) -> bool {
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        in_unit(self.x)
            && in_unit(self.y)
            && in_unit(self.width)
            && in_unit(self.height)
            && self.x + self.width <= 1.0
            && self.y + self.height <= 1.0
    }
}

impl std::str::FromStr for NormalizedBox {
    type Err = String;

    /// Parses `x,y,width,height`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("invalid box '{s}': {e}"))?;
        match parts.as_slice() {
            [x, y, w, h] => Ok(NormalizedBox::new(*x, *y, *w, *h)),
            _ => Err(format!(
                "invalid box '{s}': expected 4 comma-separated values, got {}",
                parts.len()
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MealSlot {
    Date,
    LightMeal,
    MenuOne,
    MenuTwo,
}

impl MealSlot {
    /// Top to bottom, as printed.
    pub const ALL: [MealSlot; 4] = [
        MealSlot::Date,
        MealSlot::LightMeal,
        MealSlot::MenuOne,
        MealSlot::MenuTwo,
    ];

    pub fn row(self) -> usize {
        match self {
            MealSlot::Date => 0,
            MealSlot::LightMeal => 1,
            MealSlot::MenuOne => 2,
            MealSlot::MenuTwo => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MealSlot::Date => "Datum",
            MealSlot::LightMeal => "Brotzeit",
            MealSlot::MenuOne => "MenuI",
            MealSlot::MenuTwo => "MenuII",
        }
    }
}

impl std::fmt::Display for MealSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Layout {
    /// Maps a weekday name to its column, ignoring case and surrounding whitespace.
    pub fn resolve(&self, day: &str) -> Result<usize, MenuError> {
        let wanted = day.trim().to_lowercase();
        self.weekdays
            .iter()
            .position(|d| d.to_lowercase() == wanted)
            .ok_or_else(|| MenuError::UnrecognizedWeekday(day.to_string()))
    }

    /// Like [`Layout::resolve`], for weekdays that arrive as loosely typed JSON.
    pub fn resolve_value(&self, day: &Value) -> Result<usize, MenuError> {
        let day = weekday_str(day)?;
        self.resolve(day)
    }

    pub fn box_for(&self, column: usize, slot: MealSlot) -> NormalizedBox {
        NormalizedBox::new(
            self.column_origin + column as f64 * self.column_width,
            self.row_origin + slot.row() as f64 * self.row_height,
            self.column_width,
            self.row_height,
        )
    }

    /// Counts the boxes that stick out of the page, logging each one.
    pub fn check(&self) -> usize {
        let mut outside = 0;
        for (column, day) in self.weekdays.iter().enumerate() {
            for slot in MealSlot::ALL {
                let b = self.box_for(column, slot);
                if !b.fits_page() {
                    warn!("layout box for {day}/{slot} leaves the page: {b:?}");
                    outside += 1;
                }
            }
        }
        outside
    }
}

/// Rejects weekday values that are not JSON strings.
pub fn weekday_str(day: &Value) -> Result<&str, MenuError> {
    let kind = match day {
        Value::String(s) => return Ok(s.as_str()),
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    };
    warn!("the day must be a string, got {kind}: {day}");
    Err(MenuError::InvalidInput(format!("{kind} ({day})")))
}
