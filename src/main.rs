use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser};
use tracing::error;
use tracing_subscriber::EnvFilter;

use rooftop_solar::services::coordinates;
use rooftop_solar::{
    BuildingAttributes, Config, EstimateError, EstimateRequest, Orchestrator, SolarPotentialResponse,
};

const EXIT_FAILURE: u8 = 1;
const EXIT_INVALID_INPUT: u8 = 2;
const EXIT_NO_DATA: u8 = 3;

#[derive(Parser, Debug)]
#[command(author, version, about = "Estimate the rooftop solar potential of a Swiss building", long_about = None)]
struct Cli {
    /// JSON config file; defaults apply when it does not exist.
    #[arg(long, default_value = "config.json", env = "ROOFTOP_SOLAR_CONFIG")]
    config: PathBuf,
    /// Emit logs as JSON lines on stderr.
    #[arg(long, default_value_t = false)]
    log_json: bool,
    #[command(flatten)]
    helper: CoordinateHelper,
    #[command(flatten)]
    target: Target,
    #[command(flatten)]
    attributes: AttributeArgs,
}

#[derive(Args, Debug, Default)]
#[group(required = false, multiple = false)]
struct CoordinateHelper {
    /// Print the LV95 easting/northing of a WGS84 point and exit.
    #[arg(long, num_args = 2, value_names = ["LON", "LAT"], allow_negative_numbers = true)]
    project: Option<Vec<f64>>,
    /// Print the WGS84 longitude/latitude of an LV95 point and exit.
    #[arg(long, num_args = 2, value_names = ["E", "N"])]
    unproject: Option<Vec<f64>>,
}

#[derive(Args, Debug, Default)]
struct Target {
    /// Federal building identifier (EGID).
    #[arg(long)]
    building_id: Option<String>,
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lon: Option<f64>,
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    lat: Option<f64>,
}

#[derive(Args, Debug, Default)]
struct AttributeArgs {
    /// Total floor area across all storeys (m²).
    #[arg(long)]
    floor_area: Option<f64>,
    #[arg(long)]
    floors: Option<u32>,
    #[arg(long, allow_negative_numbers = true)]
    construction_year: Option<i32>,
    /// Registry class code ("1110") or free-text type ("warehouse").
    #[arg(long)]
    building_type: Option<String>,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print_json(value: &serde_json::Value) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(s) => {
            println!("{s}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "failed to serialize output");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    // 1. Coordinate helpers need neither config nor network
    if let Some([lon, lat]) = cli.helper.project.as_deref() {
        let p = coordinates::to_projected(*lon, *lat);
        return print_json(&serde_json::json!({ "easting": p.easting, "northing": p.northing }));
    }
    if let Some([easting, northing]) = cli.helper.unproject.as_deref() {
        let (lon, lat) = coordinates::to_geographic(*easting, *northing);
        return print_json(&serde_json::json!({ "longitude": lon, "latitude": lat }));
    }

    // 2. Load configuration
    let config = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            error!(path = %cli.config.display(), error = %e, "failed to load config");
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    // 3. Wire the orchestrator
    let orchestrator = match Orchestrator::from_config(&config) {
        Ok(o) => o,
        Err(e) => {
            error!(error = %e, "failed to initialise orchestrator");
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    // 4. Estimate
    let request = EstimateRequest {
        building_id: cli.target.building_id,
        longitude: cli.target.lon,
        latitude: cli.target.lat,
        attributes: BuildingAttributes {
            floor_area: cli.attributes.floor_area,
            floors: cli.attributes.floors,
            construction_year: cli.attributes.construction_year,
            building_type_code: cli.attributes.building_type,
        },
    };

    match orchestrator.estimate(&request).await {
        Ok(result) => match serde_json::to_value(SolarPotentialResponse::from(&result)) {
            Ok(value) => print_json(&value),
            Err(e) => {
                error!(error = %e, "failed to serialize result");
                ExitCode::from(EXIT_FAILURE)
            }
        },
        Err(e) => {
            let code = match e {
                EstimateError::Validation { .. } => EXIT_INVALID_INPUT,
                EstimateError::Resolution { .. } => EXIT_NO_DATA,
                EstimateError::Internal { .. } => EXIT_FAILURE,
            };
            println!("{}", serde_json::json!({ "error": e.to_string() }));
            ExitCode::from(code)
        }
    }
}
