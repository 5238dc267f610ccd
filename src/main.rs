#[tokio::main]
async fn main() -> anyhow::Result<()> {
    teleop_recorder::run().await
}
