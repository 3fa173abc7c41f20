use anyhow::{Context, Result};
use trailcast_weather::{Coordinates, ForecastStore, Location, TemperatureUnit};

fn main() -> Result<()> {
    // Initialize core
    trailcast_core::init()?;

    let mut app = trailcast_core::App::new()?;
    let store = app.forecasts();
    let unit = app.config().weather.temperature_unit;

    tracing::info!("Trailcast started");

    // `trailcast <lat> <lon>` registers a location and marks it viewed.
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let [lat, lon] = args.as_slice() {
        let coordinates = parse_coordinates(lat, lon)?;
        let location = Location::new(coordinates.latitude, coordinates.longitude);
        store.add_new_location(location.clone())?;
        store.mark_viewed(&location)?;
    }

    println!("Trailcast - weather for hikers");
    println!("  Data directory: {}", app.config().data_dir.display());

    println!("\nFavourites:");
    print_locations(&store, &store.get_favourites(), unit);
    println!("\nRecent locations:");
    print_locations(&store, &store.get_recent(), unit);

    app.shutdown()?;

    Ok(())
}

fn parse_coordinates(lat: &str, lon: &str) -> Result<Coordinates> {
    let latitude: f64 = lat.parse().context("Please enter latitude using digits")?;
    let longitude: f64 = lon.parse().context("Please enter longitude using digits")?;
    let coordinates = Coordinates::new(latitude, longitude);
    coordinates.validate()?;
    Ok(coordinates)
}

fn print_locations(store: &ForecastStore, locations: &[Location], unit: TemperatureUnit) {
    if locations.is_empty() {
        println!("  (none)");
        return;
    }
    for location in locations {
        let current = match store.get_forecast(location) {
            Ok(forecast) => forecast
                .and_then(|forecast| forecast.into_iter().next())
                .map(|entry| {
                    let hazard = if entry.condition.is_hazardous() {
                        " (hazardous)"
                    } else {
                        ""
                    };
                    format!(
                        "{} {}{}",
                        entry.display_temperature(unit),
                        entry.condition.description(),
                        hazard
                    )
                })
                .unwrap_or_else(|| "no forecast".to_string()),
            Err(e) => {
                tracing::warn!("{}", e);
                e.user_message().to_string()
            }
        };
        println!("  {:<30} {}", location.display_name(), current);

        if let Some(warning) = store.next_warning(location) {
            println!("    ! {}: {}", warning.severity(), warning.message());
        }
    }
}
