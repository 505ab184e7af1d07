#[rocket::main]
async fn main() {
    dotenv::dotenv().ok();
    conduit::logger::setup_logging(log::LevelFilter::Info)
        .expect("failed to initialize logging");

    if let Err(error) = conduit::rocket().launch().await {
        log::error!("server failed to launch: {}", error);
    }
}
