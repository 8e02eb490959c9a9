#[tokio::main]
async fn main() {
    if let Err(e) = medical_record_lib::run().await {
        tracing::error!("{e}");
        eprintln!("medical-record: {e}");
        std::process::exit(1);
    }
}
