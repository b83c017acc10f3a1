#[tokio::main]
async fn main() {
    eats_near_you::start_server().await;
}
