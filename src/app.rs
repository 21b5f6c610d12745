use std::path::{Path, PathBuf};

use eframe::egui;

use crate::{
    config::{AppConfig, INPUT_EXTENSIONS, OUTPUT_EXTENSION},
    convert::{self, ConversionReport},
    error::{Error, ValidationError},
    sizes::{IconSize, SizeSelection},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Warning(String),
    Error(String),
}

impl Notice {
    fn title(&self) -> &'static str {
        match self {
            Notice::Success(_) => "Success",
            Notice::Warning(_) => "Warning",
            Notice::Error(_) => "Error",
        }
    }

    fn message(&self) -> &str {
        match self {
            Notice::Success(msg) | Notice::Warning(msg) | Notice::Error(msg) => msg,
        }
    }
}

/// A validated form, ready for the converter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub sizes: Vec<IconSize>,
}

pub struct IcoConverterApp {
    config: AppConfig,
    input_path: String,
    output_path: String,
    sizes: SizeSelection,
    custom_size_draft: u32,
    logs: Vec<String>,
    notice: Option<Notice>,
    show_about: bool,
}

impl IcoConverterApp {
    pub fn new(config: AppConfig) -> Self {
        Self {
            sizes: SizeSelection::new(config.all_sizes_default),
            custom_size_draft: config.custom_size_default,
            config,
            input_path: String::new(),
            output_path: String::new(),
            logs: vec!["Image to ICO Converter started.".to_string()],
            notice: None,
            show_about: false,
        }
    }

    fn push_log(&mut self, line: String) {
        self.logs.push(line);
        let cap = self.config.max_log_lines;
        if self.logs.len() > cap {
            let keep = self.logs.split_off(self.logs.len().saturating_sub(cap));
            self.logs = keep;
        }
    }

    fn info(&mut self, msg: String) {
        log::info!("{msg}");
        self.push_log(format!("INFO: {msg}"));
    }

    fn warn(&mut self, msg: String) {
        log::warn!("{msg}");
        self.push_log(format!("WARN: {msg}"));
        self.notice = Some(Notice::Warning(msg));
    }

    fn error(&mut self, msg: String) {
        log::error!("{msg}");
        self.push_log(format!("ERR: {msg}"));
        self.notice = Some(Notice::Error(msg));
    }

    /// Checks the form fields in the order the user fills them in.
    pub fn request(&self) -> Result<ConversionRequest, ValidationError> {
        let input = self.input_path.trim();
        if input.is_empty() {
            return Err(ValidationError::MissingInput);
        }
        let output = self.output_path.trim();
        if output.is_empty() {
            return Err(ValidationError::MissingOutput);
        }
        let sizes = self.sizes.resolve()?;
        Ok(ConversionRequest {
            input: PathBuf::from(input),
            output: with_ico_extension(Path::new(output)),
            sizes,
        })
    }

    fn run(&self) -> Result<ConversionReport, Error> {
        let request = self.request()?;
        convert::convert_to_ico(
            &request.input,
            &request.output,
            &request.sizes,
            &self.config.convert,
        )
    }

    fn set_input(&mut self, path: PathBuf) {
        self.input_path = path.display().to_string();
        self.info(format!("input: {}", path.display()));
    }

    fn browse_input(&mut self) {
        let picked = rfd::FileDialog::new()
            .add_filter("Image files", &INPUT_EXTENSIONS)
            .pick_file();
        if let Some(path) = picked {
            self.set_input(path);
        }
    }

    fn browse_output(&mut self) {
        let mut dialog = rfd::FileDialog::new().add_filter("ICO files", &[OUTPUT_EXTENSION]);
        let suggested = if self.output_path.trim().is_empty() {
            suggested_output(Path::new(self.input_path.trim()))
        } else {
            Some(PathBuf::from(self.output_path.trim()))
        };
        if let Some(suggested) = suggested {
            if let Some(dir) = suggested.parent().filter(|d| !d.as_os_str().is_empty()) {
                dialog = dialog.set_directory(dir);
            }
            if let Some(name) = suggested.file_name() {
                dialog = dialog.set_file_name(name.to_string_lossy());
            }
        }
        if let Some(path) = dialog.save_file() {
            self.output_path = with_ico_extension(&path).display().to_string();
        }
    }

    fn convert_clicked(&mut self) {
        if !self.input_path.trim().is_empty() && self.output_path.trim().is_empty() {
            self.browse_output();
        }
        match self.run() {
            Ok(report) => {
                let sizes: Vec<String> = report.sizes.iter().map(ToString::to_string).collect();
                let (width, height) = report.source_dimensions;
                self.info(format!(
                    "source {width}x{height}, wrote {} bytes [{}]",
                    report.bytes_written,
                    sizes.join(", ")
                ));
                let msg = format!(
                    "Successfully converted {} to {}",
                    self.input_path.trim(),
                    report.output.display()
                );
                self.push_log(format!("INFO: {msg}"));
                self.notice = Some(Notice::Success(msg));
            }
            Err(Error::Validation(e)) => self.warn(e.to_string()),
            Err(Error::Convert(e)) => self.error(format!("An error occurred: {e}")),
        }
    }

    fn add_custom_size(&mut self) {
        match self.sizes.add_custom(self.custom_size_draft) {
            Ok(()) => {
                let side = self.custom_size_draft;
                self.info(format!("added size {side}x{side}"));
            }
            Err(e) => self.warn(e.to_string()),
        }
    }

    fn take_dropped_file(&mut self, ctx: &egui::Context) {
        let dropped: Vec<PathBuf> =
            ctx.input(|i| i.raw.dropped_files.iter().filter_map(|f| f.path.clone()).collect());
        for path in dropped {
            if has_input_extension(&path) {
                self.set_input(path);
                return;
            }
            self.push_log(format!("WARN: ignored dropped file {}", path.display()));
        }
    }

    fn notice_window(&mut self, ctx: &egui::Context) {
        let Some(notice) = &self.notice else {
            return;
        };
        let mut close = false;
        egui::Window::new(notice.title())
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(notice.message());
                ui.add_space(8.0);
                if ui.button("OK").clicked() {
                    close = true;
                }
            });
        if close {
            self.notice = None;
        }
    }

    fn about_window(&mut self, ctx: &egui::Context) {
        if !self.show_about {
            return;
        }
        let mut close = false;
        egui::Window::new("About Image to ICO Converter")
            .collapsible(false)
            .resizable(false)
            .fixed_size([300.0, 200.0])
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.heading("Image to ICO Converter");
                    ui.label(format!("Version {}", env!("CARGO_PKG_VERSION")));
                    ui.add_space(6.0);
                    ui.label("Converts JPG and PNG images to ICO format for use as Windows icons.");
                    ui.add_space(6.0);
                    if ui.button("OK").clicked() {
                        close = true;
                    }
                });
            });
        if close {
            self.show_about = false;
        }
    }
}

impl eframe::App for IcoConverterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.take_dropped_file(ctx);

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("Help", |ui| {
                    if ui.button("About").clicked() {
                        self.show_about = true;
                        ui.close_menu();
                    }
                });
            });
        });

        let mut browse_input = false;
        let mut browse_output = false;
        let mut add_custom = false;
        let mut remove_side = None;
        let mut convert = false;
        let modal_open = self.notice.is_some() || self.show_about;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_enabled_ui(!modal_open, |ui| {
                egui::Grid::new("paths")
                    .num_columns(3)
                    .spacing([8.0, 6.0])
                    .show(ui, |ui| {
                        ui.label("Input Image:");
                        ui.add(
                            egui::TextEdit::singleline(&mut self.input_path)
                                .desired_width(320.0)
                                .hint_text("drop a JPG or PNG here"),
                        );
                        if ui.button("Browse").clicked() {
                            browse_input = true;
                        }
                        ui.end_row();

                        ui.label("Output ICO:");
                        ui.add(
                            egui::TextEdit::singleline(&mut self.output_path)
                                .desired_width(320.0),
                        );
                        if ui.button("Browse").clicked() {
                            browse_output = true;
                        }
                        ui.end_row();
                    });

                ui.add_space(6.0);
                ui.group(|ui| {
                    ui.label("Icon Sizes");
                    ui.checkbox(&mut self.sizes.all_sizes, "All Sizes");
                    ui.add_enabled_ui(!self.sizes.all_sizes, |ui| {
                        egui::Grid::new("size_grid").num_columns(3).show(ui, |ui| {
                            for (i, (side, selected)) in self.sizes.flags.iter_mut().enumerate() {
                                ui.horizontal(|ui| {
                                    ui.checkbox(selected, format!("{side}x{side}"));
                                    if !SizeSelection::is_canonical(*side)
                                        && ui.small_button("x").clicked()
                                    {
                                        remove_side = Some(*side);
                                    }
                                });
                                if i % 3 == 2 {
                                    ui.end_row();
                                }
                            }
                        });
                        ui.horizontal(|ui| {
                            ui.label("Custom");
                            ui.add(
                                egui::DragValue::new(&mut self.custom_size_draft)
                                    .range(1..=256)
                                    .suffix(" px"),
                            );
                            if ui.button("Add").clicked() {
                                add_custom = true;
                            }
                        });
                    });
                });

                ui.add_space(6.0);
                ui.vertical_centered(|ui| {
                    if ui.button("Convert").clicked() {
                        convert = true;
                    }
                });
            });

            ui.separator();
            egui::CollapsingHeader::new("Activity")
                .id_salt("section_activity")
                .default_open(false)
                .show(ui, |ui| {
                    egui::ScrollArea::vertical()
                        .auto_shrink([false, false])
                        .max_height(120.0)
                        .show(ui, |ui| {
                            for line in self.logs.iter().rev().take(80) {
                                ui.monospace(line);
                            }
                        });
                });
        });

        if browse_input {
            self.browse_input();
        }
        if browse_output {
            self.browse_output();
        }
        if add_custom {
            self.add_custom_size();
        }
        if let Some(side) = remove_side {
            if self.sizes.remove_custom(side) {
                self.info(format!("removed size {side}x{side}"));
            }
        }
        if convert {
            self.convert_clicked();
        }

        self.notice_window(ctx);
        self.about_window(ctx);
    }
}

fn has_input_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            INPUT_EXTENSIONS
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext))
        })
}

/// Appends `.ico` unless the path already ends with it.
fn with_ico_extension(path: &Path) -> PathBuf {
    let is_ico = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(OUTPUT_EXTENSION));
    if is_ico {
        return path.to_path_buf();
    }
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(OUTPUT_EXTENSION);
    PathBuf::from(name)
}

fn suggested_output(input: &Path) -> Option<PathBuf> {
    let stem = input.file_stem()?;
    let mut name = stem.to_os_string();
    name.push(".");
    name.push(OUTPUT_EXTENSION);
    Some(input.with_file_name(name))
}
