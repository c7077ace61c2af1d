use retail_api::{Client, Request};

#[tokio::main]
pub async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let auth = retail_auth::connect_from_config()?;
    let client = Client::new(auth.api().clone());

    let stores = client.send(Request::stores().list()).await?;
    for store in stores {
        println!("{} {}", store.id, store.name);
    }
    Ok(())
}
