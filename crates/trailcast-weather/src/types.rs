use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Temperature unit preference for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    /// Convert a Celsius reading into this unit
    pub fn from_celsius(&self, celsius: f64) -> f64 {
        match self {
            Self::Celsius => celsius,
            Self::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Celsius => "\u{b0}C",
            Self::Fahrenheit => "\u{b0}F",
        }
    }
}

/// Weather condition tag attached to each forecast sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    #[default]
    Clear,
    PartlyCloudy,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    HeavyRain,
    Snow,
    Sleet,
    Thunderstorm,
}

impl WeatherCondition {
    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::PartlyCloudy => "Partly Cloudy",
            Self::Cloudy => "Cloudy",
            Self::Fog => "Fog",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::HeavyRain => "Heavy Rain",
            Self::Snow => "Snow",
            Self::Sleet => "Sleet",
            Self::Thunderstorm => "Thunderstorm",
        }
    }

    /// Whether the condition makes a route noticeably harder going.
    pub fn is_hazardous(&self) -> bool {
        matches!(
            self,
            Self::Fog | Self::HeavyRain | Self::Snow | Self::Sleet | Self::Thunderstorm
        )
    }
}

/// One time-stamped forecast sample for a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub time: DateTime<Utc>,
    /// Degrees Celsius
    pub temperature: f64,
    pub condition: WeatherCondition,
}

impl ForecastEntry {
    pub fn new(time: DateTime<Utc>, temperature: f64, condition: WeatherCondition) -> Self {
        Self {
            time,
            temperature,
            condition,
        }
    }

    /// Temperature rounded to whole degrees in the requested unit, e.g. `"12°C"`.
    pub fn display_temperature(&self, unit: TemperatureUnit) -> String {
        format!("{:.0}{}", unit.from_celsius(self.temperature), unit.symbol())
    }
}

/// Sort a forecast sequence into ascending time order, keeping the
/// relative order of samples that share a timestamp.
pub fn sort_forecast(entries: &mut [ForecastEntry]) {
    entries.sort_by_key(|e| e.time);
}
