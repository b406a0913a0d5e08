#[tokio::main]
async fn main() {
    vaquita::start_server().await;
}
