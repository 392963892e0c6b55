use iridl::{BatchRequest, ClientConfig, IriClient, IridlError, Site};

#[tokio::main]
async fn main() -> Result<(), IridlError> {
    let client = IriClient::with_config(ClientConfig::builder().max_concurrency(2).build())?;

    let request = BatchRequest::builder()
        .variable("precipitation")
        .aggregation(("sum".to_string(), "3".to_string()))
        .build();
    let sites = vec![
        Site::new("nairobi", -1.2921, 36.8219),
        Site::new("nowhere", 123.0, 0.0),
        Site::new("dakar", 14.7167, -17.4677),
    ];

    for result in client.batch().request(&request).sites(sites).call().await {
        match &result.outcome {
            Ok(table) => {
                let last = table.rows().last();
                println!("{:>8}: {} months, last {:?}", result.site.id, table.len(), last);
            }
            Err(e) => println!("{:>8}: {:?} ({})", result.site.id, e.kind(), e),
        }
    }

    Ok(())
}
