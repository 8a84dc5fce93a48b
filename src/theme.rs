use crate::chat::Sender;
use eframe::egui::{self, Color32, CornerRadius, FontId, Frame, Margin, Stroke, TextStyle};

#[derive(Debug, Clone)]
pub struct Theme {
    pub surface: Color32,
    pub panel: Color32,
    pub composer: Color32,
    pub user_bubble: Color32,
    pub bot_bubble: Color32,
    pub teal: Color32,
    pub teal_deep: Color32,
    pub chip: Color32,
    pub text_primary: Color32,
    pub text_muted: Color32,
    pub text_on_accent: Color32,
    pub danger: Color32,
    pub spacing_8: f32,
    pub spacing_12: f32,
    pub radius_bubble: u8,
    pub radius_chip: u8,
    pub line_height: f32,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            surface: Color32::from_rgb(0xF4, 0xF8, 0xF8),
            panel: Color32::from_rgb(0xFF, 0xFF, 0xFF),
            composer: Color32::from_rgb(0xEC, 0xF3, 0xF3),
            user_bubble: Color32::from_rgb(0x14, 0xB8, 0xA6),
            bot_bubble: Color32::from_rgb(0xE6, 0xF2, 0xF1),
            teal: Color32::from_rgb(0x14, 0xB8, 0xA6),
            teal_deep: Color32::from_rgb(0x0D, 0x94, 0x88),
            chip: Color32::from_rgb(0xD5, 0xEE, 0xEB),
            text_primary: Color32::from_rgb(0x1F, 0x2A, 0x37),
            text_muted: Color32::from_rgb(0x6B, 0x72, 0x80),
            text_on_accent: Color32::WHITE,
            danger: Color32::from_rgb(0xDC, 0x26, 0x26),
            spacing_8: 8.0,
            spacing_12: 12.0,
            radius_bubble: 14,
            radius_chip: 16,
            line_height: 24.0,
        }
    }
}

impl Theme {
    pub fn apply_visuals(&self, ctx: &egui::Context) {
        let mut visuals = egui::Visuals::light();
        visuals.panel_fill = self.surface;
        visuals.window_fill = self.panel;
        visuals.override_text_color = Some(self.text_primary);
        visuals.selection.bg_fill = self.teal;
        visuals.hyperlink_color = self.teal_deep;
        visuals.widgets.inactive.bg_stroke = Stroke::NONE;
        visuals.widgets.hovered.bg_stroke = Stroke::new(1.0, self.teal);
        visuals.window_corner_radius = CornerRadius::same(self.radius_bubble);

        let mut style = (*ctx.style()).clone();
        style.visuals = visuals;
        style.spacing.item_spacing = egui::vec2(self.spacing_8, self.spacing_8);
        style.spacing.button_padding = egui::vec2(self.spacing_12, 6.0);
        style.text_styles.insert(TextStyle::Heading, FontId::proportional(20.0));
        style.text_styles.insert(TextStyle::Body, FontId::proportional(15.0));
        style.text_styles.insert(TextStyle::Small, FontId::proportional(11.0));
        ctx.set_style(style);
    }

    pub fn bubble_fill(&self, sender: Sender) -> Color32 {
        match sender {
            Sender::User => self.user_bubble,
            Sender::Bot => self.bot_bubble,
        }
    }

    pub fn bubble_text(&self, sender: Sender) -> Color32 {
        match sender {
            Sender::User => self.text_on_accent,
            Sender::Bot => self.text_primary,
        }
    }

    pub fn bubble_frame(&self, sender: Sender) -> Frame {
        Frame::new()
            .fill(self.bubble_fill(sender))
            .inner_margin(Margin::symmetric(self.spacing_12 as i8, self.spacing_8 as i8))
            .corner_radius(CornerRadius::same(self.radius_bubble))
    }

    pub fn composer_frame(&self) -> Frame {
        Frame::new()
            .fill(self.composer)
            .inner_margin(Margin::symmetric(self.spacing_12 as i8, self.spacing_8 as i8))
            .corner_radius(CornerRadius::same(self.radius_bubble))
            .stroke(Stroke::NONE)
    }

    pub fn voice_button(&self, listening: bool) -> (Color32, Color32) {
        if listening {
            (self.teal, self.text_on_accent)
        } else {
            (self.chip, self.text_primary)
        }
    }

    pub fn composer_height(&self, rows: usize) -> f32 {
        rows as f32 * self.line_height
    }
}
