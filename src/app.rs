use crate::chat::{Message, Sender};
use crate::config::AppConfig;
use crate::controller::{ChatController, WelcomePanel};
use crate::theme::Theme;
use eframe::egui::{self, Align, Layout, RichText, ScrollArea};
use std::time::Duration;

const COMPOSER_ID: &str = "composer";

pub struct HealthMateApp {
    controller: ChatController,
    theme: Theme,
    languages: Vec<String>,
    language: String,
    suggestions: Vec<String>,
    composer_max_rows: usize,
    welcome_fade: Duration,
    focus_requested: bool,
}

impl HealthMateApp {
    pub fn new(controller: ChatController, config: &AppConfig) -> Self {
        let language = config
            .languages
            .first()
            .cloned()
            .unwrap_or_else(|| "english".to_string());
        Self {
            controller,
            theme: Theme::default(),
            languages: config.languages.clone(),
            language,
            suggestions: config.suggestions.clone(),
            composer_max_rows: config.composer_max_rows,
            welcome_fade: config.timings.welcome_fade(),
            focus_requested: false,
        }
    }

    pub fn install(&mut self, ctx: &egui::Context) {
        self.theme.apply_visuals(ctx);
        self.controller.attach_repaint(ctx.clone());
        self.controller.start();
    }

    fn input_blocked(&self) -> bool {
        self.controller.current_notice().is_some()
    }

    fn render(&mut self, ctx: &egui::Context) {
        self.controller.pump();
        self.render_top_bar(ctx);
        self.render_composer(ctx);
        self.render_diagnostics(ctx);
        self.render_transcript(ctx);
        self.render_notice(ctx);
    }

    fn render_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading(RichText::new("🏥 HealthMate").color(self.theme.teal_deep));
                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    egui::ComboBox::from_id_salt("language")
                        .selected_text(self.language.clone())
                        .show_ui(ui, |ui| {
                            for language in &self.languages {
                                ui.selectable_value(&mut self.language, language.clone(), language);
                            }
                        });
                    ui.label(RichText::new("Language").color(self.theme.text_muted));
                });
            });
        });
    }

    fn render_composer(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("composer_panel").show(ctx, |ui| {
            ui.add_space(self.theme.spacing_8);
            ui.horizontal_wrapped(|ui| {
                let mut chosen: Option<String> = None;
                for suggestion in &self.suggestions {
                    let chip = egui::Button::new(
                        RichText::new(suggestion).color(self.theme.text_primary),
                    )
                    .fill(self.theme.chip)
                    .corner_radius(egui::CornerRadius::same(self.theme.radius_chip));
                    if ui.add(chip).clicked() {
                        chosen = Some(suggestion.clone());
                    }
                }
                if let Some(suggestion) = chosen {
                    self.controller.choose_suggestion(&suggestion);
                }
            });

            let composer_id = egui::Id::new(COMPOSER_ID);
            let awaiting = self.controller.is_awaiting_reply();
            let hint = if awaiting {
                "Waiting for response..."
            } else {
                "Type your health question..."
            };

            let has_focus = ui.memory(|memory| memory.has_focus(composer_id));
            let enter_pressed = has_focus
                && ui.input_mut(|input| {
                    enter_sends(input.key_pressed(egui::Key::Enter), input.modifiers.shift)
                        && input.consume_key(egui::Modifiers::NONE, egui::Key::Enter)
                });

            let mut send_now = enter_pressed;
            let mut voice_now = false;
            self.theme.composer_frame().show(ui, |ui| {
                ui.horizontal(|ui| {
                    let (fill, text) = self.theme.voice_button(self.controller.is_listening());
                    let voice = egui::Button::new(RichText::new("🎤").color(text))
                        .fill(fill)
                        .corner_radius(egui::CornerRadius::same(self.theme.radius_chip));
                    voice_now = ui.add(voice).on_hover_text("Speak your question").clicked();

                    let send_width = 72.0;
                    let rows = composer_rows(self.controller.input(), self.composer_max_rows);
                    ScrollArea::vertical()
                        .id_salt("composer_scroll")
                        .max_height(self.theme.composer_height(self.composer_max_rows))
                        .max_width(ui.available_width() - send_width)
                        .show(ui, |ui| {
                            let response = ui.add(
                                egui::TextEdit::multiline(self.controller.input_mut())
                                    .id(composer_id)
                                    .desired_rows(rows)
                                    .desired_width(f32::INFINITY)
                                    .hint_text(hint),
                            );
                            if !self.focus_requested {
                                response.request_focus();
                                self.focus_requested = true;
                            }
                        });

                    let can_send = !awaiting && !self.controller.input().trim().is_empty();
                    let send = egui::Button::new(
                        RichText::new("Send").color(self.theme.text_on_accent),
                    )
                    .fill(self.theme.teal)
                    .corner_radius(egui::CornerRadius::same(self.theme.radius_chip));
                    send_now |= ui.add_enabled(can_send, send).clicked();
                });
            });
            ui.add_space(self.theme.spacing_8);

            if self.input_blocked() {
                return;
            }
            if voice_now {
                self.controller.start_voice_capture(&self.language);
            }
            if send_now {
                self.controller.send_staged(&self.language);
            }
        });
    }

    fn render_transcript(&mut self, ctx: &egui::Context) {
        let scroll_now = self.controller.take_scroll_request();
        let welcome = self.controller.welcome();
        let fade = ctx.animate_bool_with_time(
            egui::Id::new("welcome_fade"),
            welcome == WelcomePanel::Visible,
            self.welcome_fade.as_secs_f32(),
        );

        egui::CentralPanel::default().show(ctx, |ui| {
            if welcome != WelcomePanel::Hidden {
                ui.scope(|ui| {
                    ui.set_opacity(fade);
                    ui.vertical_centered(|ui| {
                        ui.add_space(self.theme.spacing_12);
                        ui.heading(RichText::new("Welcome to HealthMate").color(self.theme.teal_deep));
                        ui.label(
                            RichText::new("Your assistant for symptoms, nutrition, exercise and vaccinations.")
                                .color(self.theme.text_muted),
                        );
                    });
                });
                ui.separator();
            }

            ScrollArea::vertical()
                .id_salt("chat_transcript")
                .auto_shrink([false, false])
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    for message in self.controller.transcript().messages() {
                        render_message(ui, &self.theme, message);
                    }

                    if self.controller.is_typing() {
                        ui.horizontal(|ui| {
                            ui.label(Sender::Bot.avatar());
                            self.theme.bubble_frame(Sender::Bot).show(ui, |ui| {
                                ui.add(egui::Spinner::new().color(self.theme.teal));
                            });
                        });
                    }

                    if scroll_now {
                        ui.scroll_to_cursor(Some(Align::BOTTOM));
                    }
                });
        });
    }

    fn render_diagnostics(&mut self, ctx: &egui::Context) {
        if self.controller.diagnostics().is_empty() {
            return;
        }
        egui::TopBottomPanel::bottom("diagnostics_panel").show(ctx, |ui| {
            egui::CollapsingHeader::new("Diagnostics")
                .default_open(false)
                .show(ui, |ui| {
                    ScrollArea::vertical()
                        .id_salt("diagnostics_log")
                        .max_height(90.0)
                        .stick_to_bottom(true)
                        .show(ui, |ui| {
                            for entry in self.controller.diagnostics() {
                                ui.label(RichText::new(entry).color(self.theme.danger).small());
                            }
                        });
                });
        });
    }

    fn render_notice(&mut self, ctx: &egui::Context) {
        let Some(notice) = self.controller.current_notice() else {
            return;
        };
        let modal = egui::Modal::new(egui::Id::new("notice")).show(ctx, |ui| {
            ui.set_max_width(320.0);
            ui.label(notice.message());
            ui.add_space(self.theme.spacing_8);
            ui.button("OK").clicked()
        });
        let acknowledged = modal.inner || modal.should_close();
        if acknowledged {
            self.controller.acknowledge_notice();
        }
    }
}

fn render_message(ui: &mut egui::Ui, theme: &Theme, message: &Message) {
    let layout = match message.sender {
        Sender::User => Layout::right_to_left(Align::Min),
        Sender::Bot => Layout::left_to_right(Align::Min),
    };
    ui.with_layout(layout, |ui| {
        ui.label(message.sender.avatar());
        theme.bubble_frame(message.sender).show(ui, |ui| {
            ui.set_max_width(ui.available_width() * 0.75);
            ui.vertical(|ui| {
                let color = theme.bubble_text(message.sender);
                for line in message.lines() {
                    ui.label(RichText::new(line).color(color));
                }
                ui.label(RichText::new(&message.timestamp).color(color).small());
            });
        });
    });
}

pub fn composer_rows(text: &str, max_rows: usize) -> usize {
    let lines = text.split('\n').count();
    lines.clamp(1, max_rows.max(1))
}

pub fn enter_sends(enter_pressed: bool, shift_held: bool) -> bool {
    enter_pressed && !shift_held
}

impl eframe::App for HealthMateApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.render(ctx);
    }
}
