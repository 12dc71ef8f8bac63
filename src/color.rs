use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use marketing_lens::data::model::Gender;

// ---------------------------------------------------------------------------
// Color palette generators
// ---------------------------------------------------------------------------

fn to_color32(rgb: Srgb) -> Color32 {
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.55, 0.65);
            to_color32(hsl.into_color())
        })
        .collect()
}

/// `n` colours running from cool blue to warm red, for ordered categories.
pub fn diverging_palette(n: usize) -> Vec<Color32> {
    let cool = Srgb::new(0.23, 0.30, 0.75);
    let warm = Srgb::new(0.71, 0.02, 0.15);
    (0..n)
        .map(|i| {
            let t = if n > 1 { i as f32 / (n - 1) as f32 } else { 0.5 };
            let lerp = |a: f32, b: f32| a + (b - a) * t;
            to_color32(Srgb::new(
                lerp(cool.red, warm.red),
                lerp(cool.green, warm.green),
                lerp(cool.blue, warm.blue),
            ))
        })
        .collect()
}

pub fn gender_color(gender: Gender) -> Color32 {
    match gender {
        Gender::Male => Color32::from_rgb(52, 101, 196),
        Gender::Female => Color32::from_rgb(232, 130, 175),
    }
}

// ---------------------------------------------------------------------------
// Category → colour mapping
// ---------------------------------------------------------------------------

/// Maps category labels (e.g. marital statuses) to distinct colours.
#[derive(Debug, Clone, Default)]
pub struct CategoryColors {
    mapping: BTreeMap<String, Color32>,
}

impl CategoryColors {
    pub fn new<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        let labels: Vec<&str> = labels.into_iter().collect();
        let mapping = labels
            .iter()
            .zip(generate_palette(labels.len()))
            .map(|(l, c)| (l.to_string(), c))
            .collect();
        Self { mapping }
    }

    pub fn color_for(&self, label: &str) -> Color32 {
        self.mapping.get(label).copied().unwrap_or(Color32::GRAY)
    }
}
