use image::imageops::FilterType;

use crate::convert::ConvertOptions;

/// Extensions the input picker offers and drag-and-drop accepts.
pub const INPUT_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

pub const OUTPUT_EXTENSION: &str = "ico";

/// Startup settings. Built from defaults on every launch, never persisted.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub window_size: [f32; 2],
    pub min_window_size: [f32; 2],
    pub all_sizes_default: bool,
    pub custom_size_default: u32,
    pub convert: ConvertOptions,
    pub max_log_lines: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window_size: [520.0, 340.0],
            min_window_size: [460.0, 300.0],
            all_sizes_default: true,
            custom_size_default: 24,
            convert: ConvertOptions {
                filter: FilterType::Lanczos3,
            },
            max_log_lines: 300,
        }
    }
}
