use crate::layout::{MealSlot, NormalizedBox, PixelRect};
use serde::{Deserialize, Serialize};

/// Recognized text for one weekday, keyed the way the printed menu labels its rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealResult {
    #[serde(rename = "Datum")]
    pub date: String,
    #[serde(rename = "Brotzeit")]
    pub light_meal: String,
    #[serde(rename = "MenuI")]
    pub menu_one: String,
    #[serde(rename = "MenuII")]
    pub menu_two: String,
}

impl MealResult {
    pub fn get(&self, slot: MealSlot) -> &str {
        match slot {
            MealSlot::Date => &self.date,
            MealSlot::LightMeal => &self.light_meal,
            MealSlot::MenuOne => &self.menu_one,
            MealSlot::MenuTwo => &self.menu_two,
        }
    }

    pub fn set(&mut self, slot: MealSlot, text: String) {
        match slot {
            MealSlot::Date => self.date = text,
            MealSlot::LightMeal => self.light_meal = text,
            MealSlot::MenuOne => self.menu_one = text,
            MealSlot::MenuTwo => self.menu_two = text,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (MealSlot, &str)> {
        MealSlot::ALL.into_iter().map(move |s| (s, self.get(s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionReport {
    pub slot: MealSlot,
    pub normalized: NormalizedBox,
    pub pixels: PixelRect,
}

/// Everything one weekday's extraction produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Extraction {
    pub day: String,
    pub column: usize,
    pub page: PageSize,
    pub regions: Vec<RegionReport>,
    pub meals: MealResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayMeals {
    pub day: String,
    pub meals: MealResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub input: String,
    pub input_sha256: String,
    pub started: String,
    pub finished: String,
    pub extraction: Extraction,
}
