use iridl::{IriClient, IridlError};
use std::env;

#[tokio::main]
async fn main() -> Result<(), IridlError> {
    configure_polars_display();
    let client = IriClient::new()?;

    let query = client
        .query()
        .with_variable("air_temperature")?
        .filter_point(45.67, -85.553)?
        .aggregate("runningAverage", "12")?;
    println!("{}", query.to_url());

    let table = client.series().query(&query).call().await?;
    let frame = table.lazy()?.collect()?;
    println!("{}", frame.tail(Some(12)));

    Ok(())
}

fn configure_polars_display() {
    // show every column
    env::set_var("POLARS_FMT_MAX_COLS", "-1");
    env::set_var("POLARS_FMT_MAX_ROWS", "24");
}
