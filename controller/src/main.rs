mod host;
mod sim;
mod store;
mod world;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    host::run().await
}
