use eyre::Report;

#[tokio::main]
async fn main() -> Result<(), Report> {
    payhook::run().await
}
