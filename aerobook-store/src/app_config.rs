use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
}

/// Locations of the three data files.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DataConfig {
    pub flights_file: String,
    pub customers_file: String,
    pub bookings_file: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            flights_file: "./resources/data/flights.txt".to_string(),
            customers_file: "./resources/data/customers.txt".to_string(),
            bookings_file: "./resources/data/bookings.txt".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data: DataConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in.
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `AEROBOOK_DATA__FLIGHTS_FILE=/tmp/flights.txt`
            .add_source(config::Environment::with_prefix("AEROBOOK").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
