//! services/site/src/adapters/weather.rs
//!
//! Weather widget data. Until a forecast provider is wired in, the widget
//! shows a fixed snapshot for the three towns the tours start from.

use meadowlark_core::domain::{WeatherContext, WeatherLocation};
use meadowlark_core::ports::WeatherService;

#[derive(Clone, Default)]
pub struct StaticWeather;

impl WeatherService for StaticWeather {
    fn weather_data(&self) -> WeatherContext {
        WeatherContext {
            locations: vec![
                location("Portland", "cloudy", "Overcast", "54.1 F (12.3 C)"),
                location("Bend", "partlycloudy", "Partly Cloudy", "55.0 F (12.8 C)"),
                location("Manzanita", "rain", "Light Rain", "55.0 F (12.8 C)"),
            ],
        }
    }
}

fn location(name: &str, icon: &str, weather: &str, temp: &str) -> WeatherLocation {
    WeatherLocation {
        name: name.to_string(),
        forecast_url: format!("http://www.wunderground.com/US/OR/{}.html", name),
        icon_url: format!("http://icons-ak.wxug.com/i/c/k/{}.gif", icon),
        weather: weather.to_string(),
        temp: temp.to_string(),
    }
}
