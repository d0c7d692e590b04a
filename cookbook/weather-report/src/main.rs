use std::io::{self, BufRead, Write};

use poet_relay::{init_tracing, AppConfig, PoetError, WeatherClient, WeatherOutcome};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging.level)?;
    let client = WeatherClient::new(config.weather);

    print!("Enter your location: ");
    io::stdout().flush()?;
    let mut location = String::new();
    io::stdin().lock().read_line(&mut location)?;

    match client.lookup(&location).await {
        Ok(WeatherOutcome::Report(report)) => {
            println!("\nWeather Report:\n");
            println!("{report}");
        }
        Ok(WeatherOutcome::LocationNotFound { location }) => {
            println!(
                "Error: Could not find weather information for '{location}'. Please check the location name."
            );
        }
        Ok(WeatherOutcome::EmptyLocation) => println!("Location cannot be empty."),
        Ok(WeatherOutcome::Failed { status, stderr }) => {
            match status {
                Some(code) => println!("Error fetching weather data. Client exited with status {code}."),
                None => println!("Error fetching weather data. Client was terminated by a signal."),
            }
            if !stderr.is_empty() {
                println!("Details: {stderr}");
            }
        }
        Err(PoetError::ToolUnavailable(program)) => {
            println!("Error: {program} is not installed. Please install {program} to use this tool.");
        }
        Err(err) => {
            tracing::error!(error = %err, "weather lookup failed");
            println!("An unexpected error occurred: {err}");
        }
    }
    Ok(())
}
