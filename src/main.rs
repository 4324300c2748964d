#![allow(dead_code)] // API surface kept for future features
#![allow(clippy::too_many_arguments)]

mod app;
mod assets;
mod canvas;
mod cli;
mod components;
mod drag;
mod io;
pub mod logger;
mod ops;
mod visual;

use app::LingensApp;
use eframe::egui;

fn main() -> Result<(), eframe::Error> {
    // -- CLI / headless mode ---------------------------------------------
    if cli::CliArgs::is_cli_mode() {
        use clap::Parser;
        let args = cli::CliArgs::parse();
        let code = cli::run(args);
        std::process::exit(if code == std::process::ExitCode::SUCCESS {
            0
        } else {
            1
        });
    }

    // -- GUI mode -----------------------------------------------------

    // Initialize session log (overwrites previous session log)
    logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([960.0, 640.0])
            .with_title("Lingens"),
        ..Default::default()
    };

    eframe::run_native(
        "Lingens",
        options,
        Box::new(|cc| Box::new(LingensApp::new(cc))),
    )
}
