//! Finds the stations around a point and prints their cached daily data.
//!
//! Run twice to see the second run served from the cache:
//! `RUST_LOG=info cargo run --example fetch_station_years`

use climate_cache::{ClimateCacheError, ClimateClient, LatLon};
use std::env;

#[tokio::main]
async fn main() -> Result<(), ClimateCacheError> {
    env_logger::init();
    configure_polars_display();

    let client = ClimateClient::new().await?;
    let ottawa = LatLon(45.4215, -75.6972);

    let stations = client
        .find_stations()
        .location(ottawa)
        .radius_km(15.0)
        .call()
        .await?;
    for m in &stations {
        println!("{:>10} {:<40} {:.1} km", m.station.id, m.station.name, m.distance_km);
    }

    let ids: Vec<String> = stations.iter().take(3).map(|m| m.station.id.clone()).collect();
    let data = client
        .daily()
        .station_ids(&ids)
        .start_year(2022)
        .end_year(2023)
        .call()
        .await?;

    println!("{} daily rows", data.len());
    println!("{}", data.to_frame()?);

    Ok(())
}

fn configure_polars_display() {
    env::set_var("POLARS_FMT_MAX_COLS", "-1");
    env::set_var("POLARS_FMT_MAX_ROWS", "20");
}
