use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::{env, fs, io, path::PathBuf};
use validator::{Validate, ValidationError};

pub const CONFIG_FILE_NAME: &str = "tfsecrets.yaml";

const CLUSTER_ID_VAR: &str = "CLUSTER_ID";
const NAMESPACE_VAR: &str = "NAMESPACE";

const DEFAULT_SECRET_COUNT: usize = 5;
const DEFAULT_FIELD_COUNT: usize = 5;
const DEFAULT_OUTPUT_DIR: &str = "terraform";

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("File {0} not found")]
    FileNotFound(String),

    #[error("Parsing error: {0}")]
    ParsingError(String),

    #[error("Validation errors: {0}")]
    ValidationError(String),

    #[error("Unknown error occurred: {0}")]
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RandomSource {
    Entropy,
    Seeded(u64),
}

impl RandomSource {
    pub fn rng(&self) -> StdRng {
        match self {
            RandomSource::Entropy => StdRng::from_entropy(),
            RandomSource::Seeded(seed) => StdRng::seed_from_u64(*seed),
        }
    }
}

/// Optional overrides read from `tfsecrets.yaml`.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub secret_count: Option<usize>,

    pub field_count: Option<usize>,

    pub seed: Option<u64>,

    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Validate)]
pub struct Config {
    pub cluster_id: String,

    pub namespace: String,

    #[validate(range(min = 1, max = 1000))]
    pub secret_count: usize,

    #[validate(range(min = 1, max = 1000))]
    pub field_count: usize,

    pub random_source: RandomSource,

    #[validate(custom = "validate_output_dir")]
    pub output_dir: PathBuf,
}

impl Config {
    pub fn new(cluster_id: impl Into<String>, namespace: impl Into<String>) -> Self {
        return Self {
            cluster_id: cluster_id.into(),
            namespace: namespace.into(),
            secret_count: DEFAULT_SECRET_COUNT,
            field_count: DEFAULT_FIELD_COUNT,
            random_source: RandomSource::Entropy,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        };
    }

    /// Unset variables become empty strings, they are never an error.
    pub fn from_env() -> Self {
        return Self::new(
            env::var(CLUSTER_ID_VAR).unwrap_or_default(),
            env::var(NAMESPACE_VAR).unwrap_or_default(),
        );
    }

    pub fn with_overrides(mut self, overrides: ConfigFile) -> Self {
        if let Some(secret_count) = overrides.secret_count {
            self.secret_count = secret_count;
        }
        if let Some(field_count) = overrides.field_count {
            self.field_count = field_count;
        }
        if let Some(seed) = overrides.seed {
            self.random_source = RandomSource::Seeded(seed);
        }
        if let Some(output_dir) = overrides.output_dir {
            self.output_dir = output_dir;
        }
        return self;
    }
}

pub fn parse(path: &PathBuf) -> Result<ConfigFile, Error> {
    let contents = match fs::read_to_string(path) {
        Ok(raw_contents) => Ok(raw_contents),
        Err(error) => match error.kind() {
            io::ErrorKind::NotFound => Err(Error::FileNotFound(path.display().to_string())),
            _ => Err(Error::Unknown(error.to_string())),
        },
    }?;

    // An empty file deserializes to unit, not to a mapping.
    if contents.trim().is_empty() {
        return Ok(ConfigFile::default());
    }

    let config_file: ConfigFile = match serde_yaml::from_str(&contents) {
        Ok(data) => Ok(data),
        Err(error) => Err(Error::ParsingError(error.to_string())),
    }?;

    return Ok(config_file);
}

/// Environment first, then the overrides file at `path` if there is one.
pub fn load(path: &PathBuf) -> Result<Config, Error> {
    let overrides = match parse(path) {
        Ok(config_file) => config_file,
        Err(Error::FileNotFound(_)) => ConfigFile::default(),
        Err(error) => return Err(error),
    };

    let config = Config::from_env().with_overrides(overrides);
    match config.validate() {
        Ok(_) => (),
        Err(error) => return Err(Error::ValidationError(error.to_string())),
    }

    return Ok(config);
}

fn validate_output_dir(output_dir: &PathBuf) -> Result<(), ValidationError> {
    if output_dir.as_os_str().is_empty() {
        return Err(ValidationError::new(
            "The output directory must not be empty",
        ));
    }

    return Ok(());
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::io::Write;
    use std::path::PathBuf;

    use super::load;
    use super::parse;
    use super::Config;
    use super::ConfigFile;
    use super::Error;
    use super::RandomSource;
    use tempfile::tempdir;
    use validator::Validate;

    #[test]
    fn file_does_not_exist() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("tfsecrets.yaml");

        let result = parse(&file_path);
        assert_eq!(true, result.is_err());
        match result.err().unwrap() {
            Error::FileNotFound(_) => {}
            _ => panic!("Expected `FileNotFound` error"),
        }
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("tfsecrets.yaml");

        let config = load(&file_path).unwrap();
        assert_eq!(5, config.secret_count);
        assert_eq!(5, config.field_count);
        assert_eq!(RandomSource::Entropy, config.random_source);
        assert_eq!(PathBuf::from("terraform"), config.output_dir);
    }

    #[test]
    fn file_wrong_format() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("tfsecrets.yaml");

        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "Not yaml").unwrap();

        let result = parse(&file_path);
        assert_eq!(true, result.is_err());
        match result.err().unwrap() {
            Error::ParsingError(_) => {}
            _ => panic!("Expected `ParsingError` error"),
        }
    }

    #[test]
    fn file_unknown_key() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("tfsecrets.yaml");

        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "secret_cuont: 3").unwrap();

        let result = parse(&file_path);
        match result.err().unwrap() {
            Error::ParsingError(_) => {}
            _ => panic!("Expected `ParsingError` error"),
        }
    }

    #[test]
    fn empty_file_is_no_overrides() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("tfsecrets.yaml");
        File::create(&file_path).unwrap();

        let config_file = parse(&file_path).unwrap();
        assert_eq!(None, config_file.secret_count);
        assert_eq!(None, config_file.seed);
    }

    #[test]
    fn zero_secrets_is_rejected() {
        let config_file = ConfigFile {
            secret_count: Some(0),
            ..ConfigFile::default()
        };
        let config_contents = serde_yaml::to_string(&config_file).unwrap();

        let dir = tempdir().unwrap();
        let file_path = dir.path().join("tfsecrets.yaml");

        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "{}", config_contents).unwrap();

        let result = load(&file_path);
        assert_eq!(true, result.is_err());
        match result.err().unwrap() {
            Error::ValidationError(_) => {}
            _ => panic!("Expected `ValidationError` error"),
        }
    }

    #[test]
    fn empty_output_dir_is_rejected() {
        let config = Config::new("", "").with_overrides(ConfigFile {
            output_dir: Some(PathBuf::new()),
            ..ConfigFile::default()
        });

        assert_eq!(true, config.validate().is_err());
    }

    #[test]
    fn parses_the_overrides() {
        let config_file = ConfigFile {
            secret_count: Some(2),
            field_count: Some(3),
            seed: Some(99),
            output_dir: Some(PathBuf::from("out/tf")),
        };
        let config_contents = serde_yaml::to_string(&config_file).unwrap();

        let dir = tempdir().unwrap();
        let file_path = dir.path().join("tfsecrets.yaml");

        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "{}", config_contents).unwrap();

        let config = Config::new("cluster", "ns").with_overrides(parse(&file_path).unwrap());
        assert_eq!(false, config.validate().is_err());
        assert_eq!(2, config.secret_count);
        assert_eq!(3, config.field_count);
        assert_eq!(RandomSource::Seeded(99), config.random_source);
        assert_eq!(PathBuf::from("out/tf"), config.output_dir);
        assert_eq!("cluster", config.cluster_id);
    }
}
