#[tokio::main]
async fn main() {
    let code = bundlehost::app::startup::startup().await;
    std::process::exit(code);
}
