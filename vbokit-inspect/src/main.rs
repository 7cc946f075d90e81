/// vbokit-inspect - print what a PMD model file contains
///
/// Usage: vbokit-inspect [--preview] <model.pmd>
///
/// Textures are resolved against the file's directory. Set `RUST_LOG=debug`
/// to see the decoder's section log.
use std::env;
use std::error::Error;
use std::fs;
use std::io::stdout;
use std::path::Path;
use std::process;

use crossterm::terminal;
use log::{error, info};
use vbokit_core::{decode, Camera, Scene};
use vbokit_inspect::{AsciiPreview, Options, Summary};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let Some(options) = Options::parse(args.get(1..).unwrap_or_default()) else {
        let program = args.first().map_or("vbokit-inspect", String::as_str);
        eprintln!("Usage: {} <model.pmd> [--preview]", program);
        process::exit(2);
    };

    if let Err(e) = run(&options.path, options.preview) {
        error!("{}: {}", options.path.display(), e);
        eprintln!("{}: {}", options.path.display(), e);
        process::exit(1);
    }
}

fn run(path: &Path, preview: bool) -> Result<(), Box<dyn Error>> {
    let data = fs::read(path)?;
    info!("read {} bytes from {}", data.len(), path.display());

    let base_path = path.parent().unwrap_or_else(|| Path::new(""));
    let model = decode(&data, base_path)?;
    print!("{}", Summary::new(&model)?);

    if preview {
        // Leave a row for the prompt
        let (width, height) = terminal::size().unwrap_or((80, 24));
        let height = height.saturating_sub(1).max(1);

        let mut camera = Camera::default();
        camera.resize(u32::from(width), u32::from(height));
        let mut frame = AsciiPreview::new(usize::from(width), usize::from(height));
        frame.render_model(&model, &camera, Scene::default_light_dir());
        frame.draw(&mut stdout())?;
    }
    Ok(())
}
