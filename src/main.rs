use std::env;
use student_hub::app;
use student_hub::store::Store;

/// Main entry point for the web application
///
/// Starts the server with an optional bind address and database root taken
/// from the command line:
///
/// `student-hub [addr] [database-dir]`
///
/// # Default Configuration
/// * Binds to 127.0.0.1:3000
/// * Stores collections under ./database
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let addr = args.get(1).cloned().unwrap_or("127.0.0.1:3000".to_string());
    let database_dir = args.get(2).cloned().unwrap_or("database".to_string());

    log::info!("starting student-hub on {} (store: {})", addr, database_dir);
    app::run(&addr, Store::new(database_dir)).await
}
