#[tokio::main]
async fn main() -> anyhow::Result<()> {
    gepetinho_server::run().await
}
