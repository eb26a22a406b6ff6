#[tokio::main]
async fn main() {
    if let Err(err) = courier::mcp::server::run_stdio().await {
        eprintln!("courier: {}", err);
        std::process::exit(1);
    }
}
