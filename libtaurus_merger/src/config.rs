use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::constants::{
    CHANNELS_PER_STATION, DEFAULT_INPUT_SUFFIX, DEFAULT_OUTPUT_EXTENSION, DEFAULT_REFERENCE_RATE,
    INPUT_SUFFIX_LENGTH,
};
use super::descriptor::FileDescriptor;
use super::error::ConfigError;

/// Structure representing the application configuration. Contains pathing and merging options
/// Configs are seralizable and deserializable to YAML using serde and serde_yaml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub channel_order: Option<String>,
    pub structured_output: bool,
    pub verbose: bool,
    pub reference_rate: f64,
    pub input_suffix: String,
    pub output_extension: String,
    pub skip_malformed: bool,
}

impl Default for Config {
    /// Generate a new Config object. Paths will be empty/invalid
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("None"),
            output_path: PathBuf::from("None"),
            channel_order: None,
            structured_output: false,
            verbose: true,
            reference_rate: DEFAULT_REFERENCE_RATE,
            input_suffix: String::from(DEFAULT_INPUT_SUFFIX),
            output_extension: String::from(DEFAULT_OUTPUT_EXTENSION),
            skip_malformed: false,
        }
    }
}

impl Config {
    /// Read the configuration in a YAML file
    /// Returns a Config if successful
    pub fn read_config_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::BadFilePath(config_path.to_path_buf()));
        }

        let yaml_str = std::fs::read_to_string(config_path)?;

        Ok(serde_yaml::from_str::<Self>(&yaml_str)?)
    }

    /// Write the configuration to a YAML file
    pub fn write_config_file(&self, config_path: &Path) -> Result<(), ConfigError> {
        let yaml_str = serde_yaml::to_string(self)?;
        std::fs::write(config_path, yaml_str)?;
        Ok(())
    }

    /// Check everything that can be checked before touching any data
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.input_path.is_dir() {
            return Err(ConfigError::MissingInputDirectory(self.input_path.clone()));
        }
        if let Some(order) = &self.channel_order {
            let mut codes: Vec<char> = order.chars().collect();
            codes.sort_unstable();
            codes.dedup();
            if codes.len() != CHANNELS_PER_STATION || order.chars().count() != CHANNELS_PER_STATION
            {
                return Err(ConfigError::BadChannelOrder(order.clone()));
            }
        }
        if !self.reference_rate.is_finite() || self.reference_rate <= 0.0 {
            return Err(ConfigError::BadReferenceRate(self.reference_rate));
        }
        if self.input_suffix.chars().count() != INPUT_SUFFIX_LENGTH {
            return Err(ConfigError::BadInputSuffix(self.input_suffix.clone()));
        }
        Ok(())
    }

    /// Create the output directory if it does not exist yet
    pub fn create_output_directory(&self) -> Result<(), ConfigError> {
        if !self.output_path.exists() {
            log::info!(
                "Output directory {} does not exist, creating it",
                self.output_path.to_string_lossy()
            );
            std::fs::create_dir_all(&self.output_path)?;
        }
        Ok(())
    }

    /// Directory receiving the merged file for a descriptor found in `input_dir`
    ///
    /// Either `<output>/<YYYY>/<MM>/<DD>` when structuring by date, or the name of the input
    /// subdirectory under the output root.
    pub fn get_output_directory(&self, descriptor: &FileDescriptor, input_dir: &Path) -> PathBuf {
        if self.structured_output {
            let ts = descriptor.timestamp;
            self.output_path
                .join(format!("{:04}", ts.year()))
                .join(format!("{:02}", ts.month() as u8))
                .join(format!("{:02}", ts.day()))
        } else {
            match input_dir.file_name() {
                Some(name) => self.output_path.join(name),
                None => self.output_path.clone(),
            }
        }
    }

    /// Full path of the merged (Centaur) file named after the triplet anchor
    pub fn get_output_file_path(&self, descriptor: &FileDescriptor, input_dir: &Path) -> PathBuf {
        let file_name = format!(
            "{}.{}.{}.{}_{}_{}.{}",
            descriptor.network,
            descriptor.station,
            descriptor.location,
            descriptor.channel_stem(),
            descriptor.calendar_date,
            descriptor.time_of_day,
            self.output_extension
        );
        self.get_output_directory(descriptor, input_dir)
            .join(file_name)
    }
}
