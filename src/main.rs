use basin_hazard::output::Output;
use basin_hazard::{from_path, FeatureIndex, Location, QueryPolygon};
use log::info;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(name = "basin_hazard")]
enum Command {
    /// Print the padded bounding box of a basin collection
    Bounds {
        #[structopt(parse(from_os_str))]
        input: PathBuf,
    },
    /// Print the normalized basins
    Features {
        #[structopt(parse(from_os_str))]
        input: PathBuf,
        /// Write a GeoJSON FeatureCollection instead of JSON lines
        #[structopt(long)]
        geojson: bool,
    },
    /// Print the basin at a given location
    Hit {
        #[structopt(parse(from_os_str))]
        input: PathBuf,
        #[structopt(long, allow_hyphen_values = true)]
        lat: f64,
        #[structopt(long, allow_hyphen_values = true)]
        lon: f64,
    },
    /// Summarize the basins overlapping a GeoJSON Polygon
    Filter {
        #[structopt(parse(from_os_str))]
        input: PathBuf,
        /// File holding a GeoJSON Polygon geometry
        #[structopt(short, long, parse(from_os_str))]
        polygon: PathBuf,
        /// Write the filtered GeoJSON FeatureCollection instead of statistics
        #[structopt(long)]
        geojson: bool,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    pretty_env_logger::init();
    let command = Command::from_args();
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match command {
        Command::Bounds { input } => {
            let collection = from_path(&input)?;
            info!("{} basins in {}", collection.len(), input.display());
            writeln!(handle, "{}", serde_json::to_string(&collection.bounds)?)?;
        }
        Command::Features { input, geojson } => {
            let collection = from_path(&input)?;
            if geojson {
                collection.write_geojson(&mut handle)?;
            } else {
                collection.write_json_lines(&mut handle)?;
            }
        }
        Command::Hit { input, lat, lon } => {
            let collection = from_path(&input)?;
            let index = FeatureIndex::new(&collection.features);
            match index.hit_test(&Location::new(lat, lon)) {
                Some(hit) => {
                    let label = collection
                        .parts(hit)
                        .next()
                        .map(|part| part.label())
                        .unwrap_or_default();
                    writeln!(handle, "{} {}", hit, label)?;
                }
                None => writeln!(handle, "none")?,
            }
        }
        Command::Filter {
            input,
            polygon,
            geojson,
        } => {
            let collection = from_path(&input)?;
            let geometry: serde_json::Value =
                serde_json::from_reader(BufReader::new(File::open(polygon)?))?;
            let query = QueryPolygon::from_geojson(&geometry)?;
            let result = basin_hazard::filter_by_polygon(&query, &collection.features)?;
            info!(
                "{} of {} basins overlap the polygon",
                result.stats.count,
                collection.len()
            );
            if geojson {
                result.write_geojson(&mut handle)?;
            } else {
                result.write_json_lines(&mut handle)?;
            }
        }
    }
    Ok(())
}
