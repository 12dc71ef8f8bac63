use eframe::egui::{self, RichText, ScrollArea, Ui};
use egui_plot::{Bar, BarChart, BoxElem, BoxPlot, BoxSpread, Legend, Line, Plot, PlotPoints};

use marketing_lens::data::aggregate::{AggregateViews, HistogramBin};
use marketing_lens::data::model::Gender;

use crate::color::{diverging_palette, gender_color, CategoryColors};
use crate::state::AppState;

const CHART_HEIGHT: f32 = 280.0;
const DENSITY_POINTS: usize = 200;

// ---------------------------------------------------------------------------
// Box statistics
// ---------------------------------------------------------------------------

/// Five-number summary for a box plot, with whiskers at the most extreme
/// values inside 1.5 × IQR of the quartiles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxSummary {
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
}

impl BoxSummary {
    pub fn from_ages(ages: &[i32]) -> Option<Self> {
        if ages.is_empty() {
            return None;
        }
        let mut sorted: Vec<f64> = ages.iter().map(|&a| a as f64).collect();
        sorted.sort_by(f64::total_cmp);

        let q1 = quantile(&sorted, 0.25);
        let median = quantile(&sorted, 0.5);
        let q3 = quantile(&sorted, 0.75);
        let fence = 1.5 * (q3 - q1);
        let lower_whisker = sorted
            .iter()
            .copied()
            .find(|&v| v >= q1 - fence)
            .unwrap_or(q1);
        let upper_whisker = sorted
            .iter()
            .rev()
            .copied()
            .find(|&v| v <= q3 + fence)
            .unwrap_or(q3);

        Some(Self {
            lower_whisker,
            q1,
            median,
            q3,
            upper_whisker,
        })
    }
}

/// Linear-interpolated quantile of sorted, non-empty data.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

// ---------------------------------------------------------------------------
// Density curve
// ---------------------------------------------------------------------------

/// Gaussian kernel density of the binned ages, scaled to customers per bin so
/// it overlays the histogram bars. Each bin contributes its count at its
/// centre; the bandwidth follows Scott's rule.
pub fn age_density(bins: &[HistogramBin], points: usize) -> Vec<[f64; 2]> {
    let n: usize = bins.iter().map(|b| b.count).sum();
    let (Some(first), Some(last)) = (bins.first(), bins.last()) else {
        return Vec::new();
    };
    if n == 0 || points < 2 {
        return Vec::new();
    }
    let n_f = n as f64;
    let centre = |b: &HistogramBin| (b.start + b.end) / 2.0;

    let mean = bins.iter().map(|b| centre(b) * b.count as f64).sum::<f64>() / n_f;
    let variance = bins
        .iter()
        .map(|b| (centre(b) - mean).powi(2) * b.count as f64)
        .sum::<f64>()
        / n_f;
    let bin_width = (last.end - first.start) / bins.len() as f64;
    // A single occupied bin has zero spread; fall back to the bin width.
    let sigma = if variance > 0.0 { variance.sqrt() } else { bin_width };
    let bandwidth = sigma * n_f.powf(-0.2);

    let lo = first.start - 3.0 * bandwidth;
    let hi = last.end + 3.0 * bandwidth;
    let step = (hi - lo) / (points - 1) as f64;
    let norm = (2.0 * std::f64::consts::PI).sqrt() * bandwidth;

    (0..points)
        .map(|i| {
            let x = lo + step * i as f64;
            let density = bins
                .iter()
                .filter(|b| b.count > 0)
                .map(|b| {
                    let z = (x - centre(b)) / bandwidth;
                    b.count as f64 * (-0.5 * z * z).exp()
                })
                .sum::<f64>()
                / (n_f * norm);
            [x, density * n_f * bin_width]
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Dashboard (central panel)
// ---------------------------------------------------------------------------

/// Render the four charts in a 2×2 grid.
pub fn dashboard(ui: &mut Ui, state: &AppState) {
    if state.table.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a campaign file to begin  (File → Open…)");
        });
        return;
    }
    let views = &state.views;
    if views.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No customers match the current selection");
        });
        return;
    }

    ScrollArea::vertical().show(ui, |ui: &mut Ui| {
        ui.columns(2, |cols| {
            chart_cell(
                &mut cols[0],
                "Age distribution",
                "Number of customers in each age range.",
                |ui| age_histogram(ui, views),
            );
            chart_cell(
                &mut cols[1],
                "Age by marital status",
                "Median, quartiles and spread of age for each marital status.",
                |ui| ages_by_status(ui, views),
            );
        });
        ui.separator();
        ui.columns(2, |cols| {
            chart_cell(
                &mut cols[0],
                "Mean spend by age bracket",
                "Average total spend per ten-year age bracket.",
                |ui| mean_spend(ui, views),
            );
            chart_cell(
                &mut cols[1],
                "Population pyramid",
                "Customers per age, men to the left and women to the right.",
                |ui| population_pyramid(ui, views),
            );
        });
    });
}

fn chart_cell(ui: &mut Ui, title: &str, caption: &str, chart: impl FnOnce(&mut Ui)) {
    ui.heading(title);
    chart(ui);
    ui.label(RichText::new(caption).italics().weak());
}

fn age_histogram(ui: &mut Ui, views: &AggregateViews) {
    let bars: Vec<Bar> = views
        .histogram
        .bins
        .iter()
        .map(|b| {
            Bar::new((b.start + b.end) / 2.0, b.count as f64)
                .width(b.end - b.start)
                .name(format!("{:.0}–{:.0}", b.start, b.end))
        })
        .collect();

    let density = age_density(&views.histogram.bins, DENSITY_POINTS);

    Plot::new("age_histogram")
        .height(CHART_HEIGHT)
        .x_axis_label("Age")
        .y_axis_label("Customers")
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).color(egui::Color32::LIGHT_BLUE));
            plot_ui.line(
                Line::new(PlotPoints::from(density))
                    .color(egui::Color32::DARK_BLUE)
                    .width(2.0),
            );
        });
}

fn ages_by_status(ui: &mut Ui, views: &AggregateViews) {
    let colors = CategoryColors::new(views.ages_by_status.iter().map(|g| g.status.as_str()));

    Plot::new("ages_by_status")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("Age")
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for (i, group) in views.ages_by_status.iter().enumerate() {
                let Some(s) = BoxSummary::from_ages(&group.ages) else {
                    continue;
                };
                let spread = BoxSpread::new(s.lower_whisker, s.q1, s.median, s.q3, s.upper_whisker);
                let elem = BoxElem::new(i as f64, spread)
                    .name(&group.status)
                    .fill(colors.color_for(&group.status).gamma_multiply(0.6))
                    .box_width(0.6);
                plot_ui.box_plot(BoxPlot::new(vec![elem]).name(&group.status).horizontal());
            }
        });
}

fn mean_spend(ui: &mut Ui, views: &AggregateViews) {
    let palette = diverging_palette(views.mean_spend.len());
    let bars: Vec<Bar> = views
        .mean_spend
        .iter()
        .zip(palette)
        .enumerate()
        .map(|(i, (b, color))| {
            Bar::new(i as f64, b.mean)
                .width(0.8)
                .name(format!("{} ({} customers)", b.label, b.customers))
                .fill(color)
        })
        .collect();

    Plot::new("mean_spend")
        .height(CHART_HEIGHT)
        .x_axis_label("Age bracket")
        .y_axis_label("Mean spend ($)")
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));
        });

    let labels: Vec<&str> = views.mean_spend.iter().map(|b| b.label.as_str()).collect();
    ui.label(RichText::new(labels.join("   ")).small());
}

fn population_pyramid(ui: &mut Ui, views: &AggregateViews) {
    let side = |gender: Gender| {
        let bars: Vec<Bar> = views
            .pyramid
            .iter()
            .map(|row| {
                let value = match gender {
                    Gender::Male => row.male,
                    Gender::Female => row.female,
                };
                Bar::new(row.age as f64, value as f64).width(0.9)
            })
            .collect();
        BarChart::new(bars)
            .horizontal()
            .color(gender_color(gender))
            .name(gender.to_string())
    };

    Plot::new("population_pyramid")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("Customers")
        .y_axis_label("Age")
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for gender in Gender::ALL {
                plot_ui.bar_chart(side(gender));
            }
        });
}
