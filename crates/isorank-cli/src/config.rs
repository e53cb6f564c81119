use crate::cli::{InputArgs, ProcessArgs};
use crate::error::{CliError, Result};
use isorank::core::elements::PeriodicTable;
use isorank::engine::config::{AnalysisConfig, AnalysisConfigBuilder, ConnectivityMap};
use isorank::engine::error::EngineError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialElementsConfig {
    symbols: Option<Vec<String>>,
    numbers: Option<Vec<u8>>,
}

/// A first-connected map, either inline or as a path to a TOML file holding `offsets`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
enum PartialConnectivity {
    Path(PathBuf),
    Grid(Vec<Vec<usize>>),
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialSelectionConfig {
    isomers: Option<usize>,
    #[serde(rename = "skip-nan-gap")]
    skip_nan_gap: Option<bool>,
    #[serde(rename = "first-connected-map")]
    first_connected_map: Option<PartialConnectivity>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialOutputConfig {
    directory: Option<PathBuf>,
    #[serde(rename = "write-xyz")]
    write_xyz: Option<bool>,
    #[serde(rename = "write-poscars")]
    write_poscars: Option<bool>,
    vacuum: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialInputConfig {
    pattern: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialAnalysisConfig {
    elements: Option<PartialElementsConfig>,
    selection: Option<PartialSelectionConfig>,
    output: Option<PartialOutputConfig>,
    input: Option<PartialInputConfig>,
}

impl PartialAnalysisConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Loads the file named by `--config`, or starts from an empty configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::from_file)
    }

    /// Layers CLI flags and then `--set` values over the file values and builds the final config.
    pub fn merge_with_cli(
        mut self,
        input: &InputArgs,
        process: Option<&ProcessArgs>,
        table: &PeriodicTable,
    ) -> Result<AnalysisConfig> {
        self.apply_input_args(input);
        if let Some(args) = process {
            self.apply_process_args(args);
        }
        self.apply_set_values(&input.set_values)?;
        self.build(table)
    }

    fn apply_input_args(&mut self, args: &InputArgs) {
        if !args.elements.symbols.is_empty() {
            self.elements = Some(PartialElementsConfig {
                symbols: Some(args.elements.symbols.clone()),
                numbers: None,
            });
        } else if !args.elements.numbers.is_empty() {
            self.elements = Some(PartialElementsConfig {
                symbols: None,
                numbers: Some(args.elements.numbers.clone()),
            });
        }
        if let Some(pattern) = &args.pattern {
            self.input.get_or_insert_with(Default::default).pattern = Some(pattern.clone());
        }
        if args.skip_nan_gap {
            self.selection
                .get_or_insert_with(Default::default)
                .skip_nan_gap = Some(true);
        }
    }

    fn apply_process_args(&mut self, args: &ProcessArgs) {
        let selection = self.selection.get_or_insert_with(Default::default);
        if let Some(n) = args.isomers {
            selection.isomers = Some(n);
        }
        if let Some(path) = &args.connectivity_map {
            selection.first_connected_map = Some(PartialConnectivity::Path(path.clone()));
        }

        let output = self.output.get_or_insert_with(Default::default);
        if let Some(dir) = &args.output {
            output.directory = Some(dir.clone());
        }
        if args.write_xyz {
            output.write_xyz = Some(true);
        }
        if args.no_poscars {
            output.write_poscars = Some(false);
        }
        if let Some(vacuum) = args.vacuum {
            output.vacuum = Some(vacuum);
        }
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value_str)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };
            let key = key.trim();
            let value_str = value_str.trim();

            match key {
                "elements.symbols" => {
                    self.elements = Some(PartialElementsConfig {
                        symbols: Some(parse_list(key, value_str)?),
                        numbers: None,
                    });
                }
                "elements.numbers" => {
                    self.elements = Some(PartialElementsConfig {
                        symbols: None,
                        numbers: Some(parse_list(key, value_str)?),
                    });
                }
                "selection.isomers" => {
                    self.selection.get_or_insert_with(Default::default).isomers =
                        Some(parse_value(key, value_str)?);
                }
                "selection.skip-nan-gap" => {
                    self.selection
                        .get_or_insert_with(Default::default)
                        .skip_nan_gap = Some(parse_value(key, value_str)?);
                }
                "selection.first-connected-map" => {
                    self.selection
                        .get_or_insert_with(Default::default)
                        .first_connected_map =
                        Some(PartialConnectivity::Path(PathBuf::from(value_str)));
                }
                "output.directory" => {
                    self.output.get_or_insert_with(Default::default).directory =
                        Some(PathBuf::from(value_str));
                }
                "output.write-xyz" => {
                    self.output.get_or_insert_with(Default::default).write_xyz =
                        Some(parse_value(key, value_str)?);
                }
                "output.write-poscars" => {
                    self.output.get_or_insert_with(Default::default).write_poscars =
                        Some(parse_value(key, value_str)?);
                }
                "output.vacuum" => {
                    self.output.get_or_insert_with(Default::default).vacuum =
                        Some(parse_value(key, value_str)?);
                }
                "input.pattern" => {
                    self.input.get_or_insert_with(Default::default).pattern =
                        Some(value_str.to_string());
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }

    fn build(self, table: &PeriodicTable) -> Result<AnalysisConfig> {
        let elements = self.elements.unwrap_or_default();
        let selection = self.selection.unwrap_or_default();
        let output = self.output.unwrap_or_default();
        let input = self.input.unwrap_or_default();

        let connectivity = match selection.first_connected_map {
            None => None,
            Some(PartialConnectivity::Grid(offsets)) => Some(ConnectivityMap::new(offsets)),
            Some(PartialConnectivity::Path(path)) => {
                debug!("Loading first-connected map from {:?}", path);
                Some(ConnectivityMap::load(&path).map_err(EngineError::from)?)
            }
        };

        let mut builder = AnalysisConfigBuilder::new().connectivity_map(connectivity);
        if let Some(symbols) = elements.symbols {
            builder = builder.element_symbols(symbols);
        }
        if let Some(numbers) = elements.numbers {
            builder = builder.element_numbers(numbers);
        }
        if let Some(n) = selection.isomers {
            builder = builder.isomer_count(n);
        }
        if let Some(skip) = selection.skip_nan_gap {
            builder = builder.skip_nan_gap(skip);
        }
        if let Some(dir) = output.directory {
            builder = builder.output_directory(dir);
        }
        if let Some(write) = output.write_xyz {
            builder = builder.write_xyz(write);
        }
        if let Some(write) = output.write_poscars {
            builder = builder.write_poscars(write);
        }
        if let Some(vacuum) = output.vacuum {
            builder = builder.vacuum(vacuum);
        }
        if let Some(pattern) = input.pattern {
            builder = builder.archive_pattern(pattern);
        }

        Ok(builder.build(table).map_err(EngineError::from)?)
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        CliError::Config(format!("Invalid value for {}: '{}'", key, value))
    })
}

fn parse_list<T: FromStr>(key: &str, value: &str) -> Result<Vec<T>> {
    value
        .split(',')
        .map(|item| parse_value(key, item.trim()))
        .collect()
}
