#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod config;
mod convert;
mod error;
mod sizes;

use app::IcoConverterApp;
use config::AppConfig;
use image::{Rgba, RgbaImage};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::default();

    let viewport = egui::ViewportBuilder::default()
        .with_inner_size(config.window_size)
        .with_min_inner_size(config.min_window_size)
        .with_drag_and_drop(true)
        .with_icon(window_icon());
    let native_options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    log::info!("starting Image to ICO Converter {}", env!("CARGO_PKG_VERSION"));
    eframe::run_native(
        "Image to ICO Converter",
        native_options,
        Box::new(move |_cc| Ok(Box::new(IcoConverterApp::new(config)))),
    )
    .map_err(|e| anyhow::anyhow!("eframe run failed: {e}"))?;

    Ok(())
}

/// Draws the window icon: a rounded tile with a framed picture glyph.
fn window_icon() -> egui::IconData {
    const SIDE: u32 = 64;
    let image = RgbaImage::from_fn(SIDE, SIDE, |x, y| {
        let (fx, fy) = (x as f32 + 0.5, y as f32 + 0.5);
        let corner = |c: f32| (c - 10.0).min(0.0).abs().max((c - 54.0).max(0.0));
        let (dx, dy) = (corner(fx), corner(fy));
        if dx * dx + dy * dy > 100.0 {
            return Rgba([0, 0, 0, 0]);
        }
        let frame = (16..48).contains(&x) && (16..48).contains(&y);
        let inner = (20..44).contains(&x) && (20..44).contains(&y);
        match (frame, inner) {
            (true, false) => Rgba([245, 245, 245, 255]),
            (true, true) if y > 56 - x / 2 => Rgba([90, 180, 90, 255]),
            (true, true) => Rgba([150, 200, 240, 255]),
            _ => Rgba([0, 120, 215, 255]),
        }
    });
    egui::IconData {
        rgba: image.into_raw(),
        width: SIDE,
        height: SIDE,
    }
}
