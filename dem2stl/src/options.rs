use anyhow::{anyhow, Error as AnyError};
use clap::{ArgAction, Parser, Subcommand};
use relief::MeshConfig;
use std::{fs::File, io::BufReader, path::PathBuf, str::FromStr};

/// A tool for turning elevation rasters into 3D-printable terrain.
///
/// Mesh parameters come from defaults (A5 sheet, 20 mm relief, 3 mm
/// base, downsample 8), then the optional config file, then flags.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// JSON file with mesh parameters.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Sheet width bounding the model (mm).
    #[arg(long)]
    pub sheet_width: Option<f64>,

    /// Sheet height bounding the model (mm).
    #[arg(long)]
    pub sheet_height: Option<f64>,

    /// Height of the highest point above the base (mm).
    #[arg(long)]
    pub max_height: Option<f64>,

    /// Solid thickness under the lowest point (mm).
    #[arg(long)]
    pub base_thickness: Option<f64>,

    /// Source pixels per mesh cell along each axis.
    #[arg(short, long)]
    pub downsample: Option<usize>,

    /// Add vertical walls to close the model.
    #[arg(long, action = ArgAction::Set, value_name = "BOOL")]
    pub side_walls: Option<bool>,

    /// Override the raster's pixel size, "x,y" in native units.
    #[arg(long)]
    pub pixel_size: Option<PixelSize>,

    /// Elevation raster (.hgt, .tif, .tiff).
    pub input: PathBuf,

    #[command(subcommand)]
    pub cmd: Command,
}

impl Cli {
    /// Returns mesh parameters with file values and flags applied.
    pub fn mesh_config(&self) -> Result<MeshConfig, AnyError> {
        let mut config = match &self.config {
            Some(path) => serde_json::from_reader(BufReader::new(File::open(path)?))?,
            None => MeshConfig::default(),
        };
        if let Some(sheet_width) = self.sheet_width {
            config.sheet_width_mm = sheet_width;
        }
        if let Some(sheet_height) = self.sheet_height {
            config.sheet_height_mm = sheet_height;
        }
        if let Some(max_height) = self.max_height {
            config.max_height_mm = max_height;
        }
        if let Some(base_thickness) = self.base_thickness {
            config.base_thickness_mm = base_thickness;
        }
        if let Some(downsample) = self.downsample {
            config.downsample = downsample;
        }
        if let Some(side_walls) = self.side_walls {
            config.side_walls = side_walls;
        }
        Ok(config)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelSize(pub f64, pub f64);

impl FromStr for PixelSize {
    type Err = AnyError;
    fn from_str(s: &str) -> Result<Self, AnyError> {
        let (x_str, y_str) = s
            .split_once(',')
            .ok_or(anyhow!("not a valid x,y pair"))?;
        let x = f64::from_str(x_str.trim())?;
        let y = f64::from_str(y_str.trim())?;
        Ok(Self(x, y))
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write the terrain mesh as binary STL.
    Stl {
        /// STL file path.
        out: PathBuf,
    },

    /// Print grid, scale, and mesh figures as JSON.
    Info,
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command, PixelSize};
    use clap::{CommandFactory, Parser};
    use relief::MeshConfig;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_pixel_size() {
        assert_eq!("90,90".parse::<PixelSize>().unwrap(), PixelSize(90.0, 90.0));
        assert_eq!(
            " 0.5 , 0.25".parse::<PixelSize>().unwrap(),
            PixelSize(0.5, 0.25)
        );
        assert!("90".parse::<PixelSize>().is_err());
        assert!("a,b".parse::<PixelSize>().is_err());
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["dem2stl", "dem.tif", "info"]);
        assert!(matches!(cli.cmd, Command::Info));
        assert_eq!(cli.mesh_config().unwrap(), MeshConfig::default());
    }

    #[test]
    fn test_flags_override_file() {
        let path = std::env::temp_dir().join(format!("dem2stl-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "max_height_mm": 35.0, "downsample": 2 }"#).unwrap();
        let cli = Cli::parse_from([
            "dem2stl",
            "--config",
            path.to_str().unwrap(),
            "-d",
            "4",
            "--side-walls",
            "true",
            "dem.hgt",
            "stl",
            "out.stl",
        ]);
        assert!(matches!(cli.cmd, Command::Stl { .. }));
        assert_eq!(
            cli.mesh_config().unwrap(),
            MeshConfig {
                max_height_mm: 35.0,
                downsample: 4,
                side_walls: true,
                ..MeshConfig::default()
            }
        );
    }

    #[test]
    fn test_flag_disables_file_walls() {
        let path =
            std::env::temp_dir().join(format!("dem2stl-walls-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "side_walls": true }"#).unwrap();
        let config_path = path.to_str().unwrap();

        let cli = Cli::parse_from(["dem2stl", "--config", config_path, "dem.tif", "info"]);
        assert!(cli.mesh_config().unwrap().side_walls);

        let cli = Cli::parse_from([
            "dem2stl",
            "--config",
            config_path,
            "--side-walls",
            "false",
            "dem.tif",
            "info",
        ]);
        assert!(!cli.mesh_config().unwrap().side_walls);
    }
}
