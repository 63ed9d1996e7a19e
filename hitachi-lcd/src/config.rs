use hitachi_lcd_gpio::lcd::hd44780::{DisplayOptions, LcdPins};
use serde::{Deserialize, Serialize};
use std::env::var_os;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid value {value:?} for {var}")]
    InvalidValue { var: &'static str, value: String },
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct PinConfig {
    /// D4, D5, D6, D7.
    pub data: [usize; 4],
    pub rs: usize,
    pub rw: usize,
    pub e: usize,
}

impl Default for PinConfig {
    fn default() -> Self {
        let pins = LcdPins::default();
        PinConfig {
            data: pins.data,
            rs: pins.rs,
            rw: pins.rw,
            e: pins.e,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// GPIO character device the pins belong to.
    pub chip: String,
    pub pins: PinConfig,
    pub max_chars: usize,
    pub modeset: bool,
    pub two_lines: bool,
    pub cursor: bool,
    pub blink: bool,
    /// File or FIFO to read text from; stdin when not set.
    pub input: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        let display = DisplayOptions::default();
        Config {
            chip: "/dev/gpiochip0".to_string(),
            pins: PinConfig::default(),
            max_chars: display.max_chars,
            modeset: display.modeset,
            two_lines: display.two_lines,
            cursor: display.cursor,
            blink: display.blink,
            input: None,
        }
    }
}

impl Config {
    /// Loads the JSON config file named by `HITACHI_LCD_CONFIG` (`hitachi-lcd.json` by default),
    /// falling back to the defaults when it doesn't exist, then applies environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let config_str = var_os("HITACHI_LCD_CONFIG");
        let config_str: &OsStr = config_str.as_deref().unwrap_or(OsStr::new("hitachi-lcd.json"));
        let mut config = Self::from_file(Path::new(config_str))?.unwrap_or_default();
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(Some(serde_json::from_reader(reader)?))
    }

    /// Overrides fields from `HITACHI_LCD_*` variables, looked up through `var`.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(chip) = var("HITACHI_LCD_CHIP") {
            self.chip = chip;
        }
        if let Some(data) = var("HITACHI_LCD_PINS_DATA") {
            self.pins.data = parse_pin_bus(&data).ok_or(ConfigError::InvalidValue {
                var: "HITACHI_LCD_PINS_DATA",
                value: data,
            })?;
        }
        parse_into(&var, "HITACHI_LCD_PIN_RS", &mut self.pins.rs, parse_number)?;
        parse_into(&var, "HITACHI_LCD_PIN_RW", &mut self.pins.rw, parse_number)?;
        parse_into(&var, "HITACHI_LCD_PIN_E", &mut self.pins.e, parse_number)?;
        parse_into(&var, "HITACHI_LCD_MAX_CHARS", &mut self.max_chars, parse_number)?;
        parse_into(&var, "HITACHI_LCD_MODESET", &mut self.modeset, parse_flag)?;
        parse_into(&var, "HITACHI_LCD_TWO_LINES", &mut self.two_lines, parse_flag)?;
        parse_into(&var, "HITACHI_LCD_CURSOR", &mut self.cursor, parse_flag)?;
        parse_into(&var, "HITACHI_LCD_BLINK", &mut self.blink, parse_flag)?;
        if let Some(input) = var("HITACHI_LCD_INPUT") {
            self.input = (!input.is_empty()).then(|| PathBuf::from(input));
        }
        Ok(())
    }

    pub fn lcd_pins(&self) -> LcdPins {
        LcdPins {
            data: self.pins.data,
            rs: self.pins.rs,
            rw: self.pins.rw,
            e: self.pins.e,
        }
    }

    pub fn display_options(&self) -> DisplayOptions {
        DisplayOptions {
            max_chars: self.max_chars,
            two_lines: self.two_lines,
            modeset: self.modeset,
            cursor: self.cursor,
            blink: self.blink,
        }
    }
}

fn parse_into<T>(
    var: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    field: &mut T,
    parse: fn(&str) -> Option<T>,
) -> Result<(), ConfigError> {
    if let Some(value) = var(name) {
        *field = parse(&value).ok_or(ConfigError::InvalidValue { var: name, value })?;
    }
    Ok(())
}

fn parse_number(s: &str) -> Option<usize> {
    s.trim().parse().ok()
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parses `D4,D5,D6,D7` pin numbers, separated by commas, spaces or semicolons.
fn parse_pin_bus(pin_str: &str) -> Option<[usize; 4]> {
    pin_str
        .split([',', ' ', ';'])
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().ok())
        .collect::<Option<Vec<_>>>()?
        .try_into()
        .ok()
}
