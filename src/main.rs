use std::path::PathBuf;

use clap::Parser;
use log::{error, info};

use osm_scene::{
    GeoPoint, OverpassClient, PolicyTable, SceneBuilder, SceneConfig, SceneError, StructuralKind,
    scan_json_str, scene_to_meshes,
};

// RUST_LOG=info cargo run -- --lat 50.9786 --lon 11.0328 --radius 500
#[derive(Parser, Debug, Clone)]
#[command(about = "OSM area to 3D scene meshes", version, long_about = None)]
pub struct ClArgs {
    /// Center latitude (default: from the config)
    #[arg(long, allow_negative_numbers = true, requires = "lon")]
    pub lat: Option<f64>,
    /// Center longitude (default: from the config)
    #[arg(long, allow_negative_numbers = true, requires = "lat")]
    pub lon: Option<f64>,
    /// Radius in meters (default: from the config)
    #[arg(short, long)]
    pub radius: Option<f64>,
    /// Saved Overpass JSON result instead of a query
    #[arg(short, long)]
    pub input: Option<PathBuf>,
    /// Style file seeding the policy table
    #[arg(short, long)]
    pub style: Option<PathBuf>,
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub dark: bool,
    /// Write the meshes as JSON
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(error) = run(ClArgs::parse()).await {
        error!("{error}");
        std::process::exit(1);
    }
}

async fn run(args: ClArgs) -> Result<(), SceneError> {
    let mut config = match &args.config {
        Some(path) => SceneConfig::from_file(path)?,
        None => SceneConfig::default(),
    };
    if let (Some(latitude), Some(longitude)) = (args.lat, args.lon) {
        config.center = GeoPoint::new(latitude, longitude);
    }
    if let Some(radius) = args.radius {
        config.radius = radius;
    }
    config.render.dark_mode |= args.dark;

    let table = match &args.style {
        Some(path) => PolicyTable::from_style_file(path)?,
        None => PolicyTable::default(),
    };

    let builder = SceneBuilder::new(config, table)?;
    info!(
        "center {} radius {} m, bbox: {}",
        builder.config().center,
        builder.config().radius,
        builder.bounding_box()
    );

    let elements = match &args.input {
        Some(path) => scan_json_str(&std::fs::read_to_string(path)?)?,
        None => {
            let client = OverpassClient::new(builder.config().query.clone());
            client
                .query(builder.bounding_box(), builder.table())
                .await?
        }
    };
    if elements.is_empty() {
        return Err(SceneError::NoData { attempts: 0 });
    }

    let scene = builder.build(&elements);
    info!(
        "ways: {} rails: {} areas: {}",
        scene.count(StructuralKind::LinearWay),
        scene.count(StructuralKind::RailWay),
        scene.count(StructuralKind::ExtrudedArea)
    );

    let meshes = scene_to_meshes(&scene, &builder.config().render);
    if let Some(path) = &args.output {
        std::fs::write(path, serde_json::to_vec(&meshes)?)?;
        info!("{} meshes written to {}", meshes.len(), path.display());
    }

    Ok(())
}
