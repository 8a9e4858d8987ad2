//! Headless viewer: mounts an image with its detections, applies view
//! operations and writes the export.

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::error::Error;
    use std::fs;
    use std::path::{Path, PathBuf};

    use clap::{ArgGroup, Parser};
    use orthovision::loader::ImageLoader;
    use orthovision::{
        CanvasConfig, CanvasSession, DetectionResult, ImageDescriptor, Size, StoredSession, logging,
    };
    use web_time::Instant;

    /// Frames to run before giving up on a load.
    const MAX_SETTLE_FRAMES: usize = 16;

    #[derive(Parser, Debug)]
    #[command(
        name = "orthovision-native",
        about = "Render an X-ray with its fracture detections and export the image region",
        version,
        group(
            ArgGroup::new("input")
                .required(true)
                .args(["session", "image"])
        )
    )]
    struct Cli {
        /// Stored session JSON (image descriptor plus detectionResult)
        #[arg(long)]
        session: Option<PathBuf>,

        /// Image file to show
        #[arg(long)]
        image: Option<PathBuf>,

        /// Detection result JSON for --image
        #[arg(long, requires = "image")]
        detections: Option<PathBuf>,

        /// Quarter turns to rotate
        #[arg(long, default_value_t = 0)]
        rotate: u32,

        /// Wheel notches at the container center; positive zooms in
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        wheel: i32,

        /// Confidence threshold in [0, 1]
        #[arg(long)]
        threshold: Option<f32>,

        /// Leave detection boxes out of the export
        #[arg(long)]
        hide_overlay: bool,

        /// Container size as WIDTHxHEIGHT
        #[arg(long, default_value = "800x600", value_parser = parse_size)]
        container: Size,

        /// Also write the full viewport as `<name>-view.png`
        #[arg(long)]
        view: bool,

        /// Configuration file (defaults to the user config directory)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the effective configuration back to the config file
        #[arg(long)]
        save_config: bool,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    }

    fn parse_size(value: &str) -> Result<Size, String> {
        let (w, h) = value
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", value))?;
        let width: u32 = w.trim().parse().map_err(|e| format!("bad width: {}", e))?;
        let height: u32 = h.trim().parse().map_err(|e| format!("bad height: {}", e))?;
        if width == 0 || height == 0 {
            return Err("container must not be empty".to_string());
        }
        Ok(Size::new(f64::from(width), f64::from(height)))
    }

    fn load_config(path: Option<&Path>) -> Result<CanvasConfig, Box<dyn Error>> {
        match path {
            Some(path) => Ok(CanvasConfig::load_from_path(path)?),
            None => Ok(CanvasConfig::load_from_default_path().unwrap_or_default()),
        }
    }

    /// Persist the session's configuration to `path`, or to the user config
    /// directory when no path was given.
    fn save_config(
        session: &CanvasSession,
        path: Option<&Path>,
    ) -> Result<CanvasConfig, Box<dyn Error>> {
        let config = session.effective_config();
        match path {
            Some(path) => config.save_to_path(path)?,
            None => config.save_to_default_path()?,
        }
        Ok(config)
    }

    fn load_input(cli: &Cli) -> Result<StoredSession, Box<dyn Error>> {
        if let Some(path) = &cli.session {
            return Ok(StoredSession::from_json(&fs::read_to_string(path)?)?);
        }

        let image = cli.image.as_ref().ok_or("either --session or --image is required")?;
        let name = image
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let byte_size = fs::metadata(image).map(|m| m.len()).unwrap_or(0);
        let descriptor = ImageDescriptor::new(image.to_string_lossy())
            .with_name(name)
            .with_size(byte_size);

        let result = match &cli.detections {
            Some(path) => Some(serde_json::from_str::<DetectionResult>(&fs::read_to_string(
                path,
            )?)?),
            None => None,
        };
        Ok(StoredSession::new(descriptor, result))
    }

    fn write_file(path: &Path, bytes: &[u8]) -> Result<(), Box<dyn Error>> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, bytes)?;
        Ok(())
    }

    pub fn run() -> Result<(), Box<dyn Error>> {
        let cli = Cli::parse();
        let config = load_config(cli.config.as_deref())?;
        logging::init(config.preferences.log_level);

        let stored = load_input(&cli)?;
        let mut session = CanvasSession::with_loader(config, cli.container, ImageLoader::inline());
        session.mount_stored(stored);

        let now = Instant::now();
        let mut overlay_built = false;
        for _ in 0..MAX_SETTLE_FRAMES {
            overlay_built |= session.frame(now).overlay_built;
            if overlay_built {
                break;
            }
        }
        if !session.is_ready() {
            return Err("image did not finish loading".into());
        }

        if let Some(threshold) = cli.threshold {
            session.set_confidence_threshold(threshold);
        }
        for _ in 0..cli.rotate {
            session.rotate();
        }
        let pointer = cli.container.center();
        for _ in 0..cli.wheel.unsigned_abs() {
            let delta_y = if cli.wheel > 0 { -1.0 } else { 1.0 };
            session.wheel(pointer, delta_y, now);
        }
        if cli.hide_overlay {
            session.set_overlay_visible(false);
        }

        let snapshot = session.export()?;
        let filename = session.export_filename();
        let path = cli.out.join(&filename);
        write_file(&path, &snapshot.png)?;
        println!(
            "Wrote {} ({}x{})",
            path.display(),
            snapshot.width,
            snapshot.height
        );

        if cli.view {
            if let Some(canvas) = session.render()? {
                let stem = filename.trim_end_matches(".png");
                let view_path = cli.out.join(format!("{}-view.png", stem));
                write_file(&view_path, &canvas.encode_png()?)?;
                println!("Wrote {}", view_path.display());
            }
        }

        if cli.save_config {
            save_config(&session, cli.config.as_deref())?;
        }

        println!("{}", session.readout());
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_parse_size() {
            assert_eq!(parse_size("800x600"), Ok(Size::new(800.0, 600.0)));
            assert_eq!(parse_size("1024X768"), Ok(Size::new(1024.0, 768.0)));
            assert!(parse_size("800").is_err());
            assert!(parse_size("0x10").is_err());
        }

        #[test]
        fn test_cli_requires_input() {
            assert!(Cli::try_parse_from(["orthovision-native"]).is_err());
            assert!(Cli::try_parse_from(["orthovision-native", "--detections", "d.json"]).is_err());
            let cli = Cli::try_parse_from([
                "orthovision-native",
                "--image",
                "xray.png",
                "--wheel",
                "-3",
                "--container",
                "400x300",
            ])
            .unwrap();
            assert_eq!(cli.wheel, -3);
            assert_eq!(cli.container, Size::new(400.0, 300.0));
            assert!(!cli.save_config);
        }

        #[test]
        fn test_save_config_keeps_threshold() {
            let dir = std::env::temp_dir().join(format!("orthovision-cli-{}", std::process::id()));
            let path = dir.join(CanvasConfig::default_filename());

            let mut session = CanvasSession::with_loader(
                CanvasConfig::default(),
                Size::new(400.0, 300.0),
                ImageLoader::inline(),
            );
            session.set_confidence_threshold(0.4);
            let saved = save_config(&session, Some(&path)).unwrap();
            assert_eq!(saved.preferences.confidence_threshold, 0.4);

            let loaded = load_config(Some(&path)).unwrap();
            assert_eq!(loaded, saved);

            let _ = std::fs::remove_dir_all(&dir);
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

// WASM doesn't use main(), it uses wasm_bindgen's start function
#[cfg(target_arch = "wasm32")]
fn main() {}
