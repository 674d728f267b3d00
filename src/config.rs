use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{controller::DEFAULT_BAUD, error::Error};

/// Initial window dimensions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WindowConfig {
    /// Width in logical pixels.
    pub width: u32,

    /// Height in logical pixels.
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 600,
            height: 400,
        }
    }
}

/// The configuration used for running the terminal.
///
/// Every field may be omitted from a config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// What the baud rate field starts out as.
    pub baud: u32,

    /// Port to select at startup, if it exists.
    /// Likely "/dev/ttyACMx" or "COMx".
    pub port: Option<String>,

    /// Use an in-memory loopback port instead of real serial ports.
    pub mock: bool,

    /// Initial window size.
    pub window: WindowConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            baud: DEFAULT_BAUD,
            port: None,
            mock: false,
            window: WindowConfig::default(),
        }
    }
}

impl Config {
    fn ron() -> ron::Options {
        ron::Options::default()
            .with_default_extension(ron::extensions::Extensions::IMPLICIT_SOME)
            .with_default_extension(ron::extensions::Extensions::UNWRAP_NEWTYPES)
    }

    /// Deserialize a .ron file's contents.
    pub fn deserialize(input: &str) -> Result<Self, Error> {
        let config = Self::ron()
            .from_str::<Config>(input)
            .map_err(|e| Error::BadConfig(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// An example configuration with some fields filled in.
    pub fn example() -> Self {
        Self {
            baud: 115_200,
            port: Some("/dev/ttyACM0".into()),
            ..Default::default()
        }
    }

    /// Serialize the configuration in a "pretty" (i.e. non-compact) fashion.
    pub fn serialize_pretty(&self) -> Result<String, Error> {
        Self::ron()
            .to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| Error::BadConfig(e.to_string()))
    }

    /// Setup a new configuration from a RON file.
    pub fn new_from_path<P: AsRef<Path>>(p: P) -> Result<Self, Error> {
        let path = p.as_ref();
        let s = std::fs::read_to_string(path)
            .map_err(|e| Error::BadConfig(format!("Could not read {path:?}: {e}")))?;

        Self::deserialize(&s)
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.baud == 0 {
            return Err(Error::BadConfig(
                "The baud rate must be a positive integer".into(),
            ));
        }

        if self.window.width == 0 || self.window.height == 0 {
            return Err(Error::BadConfig(format!(
                "The window must have a non-zero size, got {}x{}",
                self.window.width, self.window.height
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn serialize() {
        let c = Config::example();

        println!("{}", c.serialize_pretty().unwrap());
    }

    #[test]
    fn example_survives_serialization() {
        let c = Config::example();
        let s = c.serialize_pretty().unwrap();

        assert_eq!(Config::deserialize(&s).unwrap(), c);
    }

    #[test]
    fn deserialize() {
        let input = r#"
(
    baud: 115200,
    port: "COM3",
    mock: false,
    window: (
        width: 800,
        height: 600,
    ),
)
"#;
        let config = Config::deserialize(input).unwrap();

        assert_eq!(config.baud, 115_200);
        assert_eq!(config.port.as_deref(), Some("COM3"));
        assert_eq!(config.window.width, 800);
    }

    #[test]
    fn everything_may_be_omitted() {
        assert_eq!(Config::deserialize("()").unwrap(), Config::default());

        let config = Config::deserialize("(mock: true)").unwrap();
        assert!(config.mock);
        assert_eq!(config.baud, 9600);
    }

    #[test]
    fn bad_config_zero_baud() {
        let err = Config::deserialize("(baud: 0)")
            .unwrap_err()
            .try_into_bad_config()
            .unwrap();

        assert!(err.contains("baud"));
    }

    #[test]
    fn bad_config_zero_window() {
        let err = Config::deserialize("(window: (width: 0, height: 400))")
            .unwrap_err()
            .try_into_bad_config()
            .unwrap();

        assert!(err.contains("0x400"));
    }

    #[test]
    fn bad_config_not_ron() {
        let err = Config::deserialize("baud = 9600").unwrap_err();

        assert!(matches!(err, Error::BadConfig(_)));
    }
}
