use crate::pipeline::{MagnitudeBand, Threshold};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols,
    widgets::{LineGauge, Widget},
};
use unicode_width::UnicodeWidthStr;

/// One-line slider: `Minimum magnitude: 2.5 0 ━━━━━━────── 7`.
#[derive(Debug, Clone)]
pub struct MagnitudeSlider {
    threshold: Threshold,
    label_style: Style,
}

impl MagnitudeSlider {
    pub fn new(threshold: Threshold) -> Self {
        Self { threshold, label_style: Style::default().fg(Color::White) }
    }

    pub fn label(&self) -> String {
        format!("Minimum magnitude: {} ", self.threshold)
    }
}

impl Widget for MagnitudeSlider {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let label = self.label();
        let label_width = u16::try_from(label.width()).unwrap_or(u16::MAX).min(area.width);
        buf.set_stringn(area.x, area.y, &label, usize::from(label_width), self.label_style);

        const MAX_LABEL: &str = " 7";
        let gauge_width = area.width.saturating_sub(label_width + MAX_LABEL.len() as u16);
        if gauge_width == 0 {
            return;
        }
        let gauge_area = Rect { x: area.x + label_width, y: area.y, width: gauge_width, height: 1 };
        // The filled part takes the colour of the weakest band still shown
        let band = MagnitudeBand::from_magnitude(self.threshold.value());
        LineGauge::default()
            .ratio(self.threshold.ratio())
            .label("0")
            .line_set(symbols::line::THICK)
            .gauge_style(Style::default().fg(band.color()).add_modifier(Modifier::BOLD))
            .render(gauge_area, buf);
        buf.set_string(gauge_area.x + gauge_width, area.y, MAX_LABEL, self.label_style);
    }
}
