use std::{env, error::Error, fs};

use qrstyle::{PartialOptions, QrCodeStyling, SaveToDir};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const USAGE: &str = "usage: qrstyle <OPTIONS_JSON | OPTIONS_FILE> [NAME] [OUT_DIR]";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(filter).with(tracing_subscriber::fmt::layer().with_target(false)).init();

    let mut args = env::args().skip(1);
    let Some(input) = args.next() else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };
    let name = args.next();
    let dir = args.next().unwrap_or_else(|| ".".to_string());

    // Inline JSON or a path to a JSON file
    let json = if input.trim_start().starts_with('{') { input } else { fs::read_to_string(&input)? };
    let partial: PartialOptions = json.parse()?;

    let qr = QrCodeStyling::new(&partial)?.with_download_trigger(SaveToDir::new(&dir));
    if let Some(m) = qr.module_matrix() {
        info!(version = m.version(), modules = m.module_count(), ecl = ?m.ec_level(), "encoded");
    }
    qr.export_file(name.as_deref()).await?;
    Ok(())
}
