#[tokio::main]
async fn main() {
    tableside::start_server().await;
}
