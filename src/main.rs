use visitor_pool_server::frameworks::{config, server};

#[tokio::main]
async fn main() {
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        None => server::run().await,
        Some("init-pool") => {
            let size = args
                .next()
                .and_then(|value| value.parse().ok())
                .unwrap_or_else(config::pool_size);
            server::run_init_pool(size).await;
        }
        Some("reclaim") => server::run_reclaim().await,
        Some("status") => server::run_status().await,
        Some(other) => {
            eprintln!("unknown command: {other}");
            eprintln!("usage: visitor_pool_server [init-pool <n> | reclaim | status]");
            std::process::exit(2);
        }
    }
}
