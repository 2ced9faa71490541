pub mod bmrs;
pub mod open_meteo;

pub use bmrs::BmrsClient;
pub use open_meteo::{OpenMeteoClient, WeatherResponse};
