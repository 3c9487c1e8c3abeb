#[tokio::main]
async fn main() -> anyhow::Result<()> {
    ideadb_api::run().await
}
