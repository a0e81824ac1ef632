use crate::frameworks::{config, db};
use crate::interface_adapters::routes::app;
use crate::interface_adapters::state::{AppState, PostgresPoolStore, SystemClock};
use crate::use_cases::initialize_pool::InitializePoolUseCase;
use crate::use_cases::pool_status::PoolStatusUseCase;
use crate::use_cases::reclaim::{NoopReclaimHook, ReclaimUseCase};
use sqlx::PgPool;
use std::net::SocketAddr;

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

// Connect and migrate, or log why we cannot.
async fn setup_db() -> Option<PgPool> {
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            tracing::error!("DATABASE_URL is not set");
            return None;
        }
    };

    let pool = match db::connect_pool(&database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "failed to connect to database");
            return None;
        }
    };

    if let Err(e) = db::run_migrations(&pool).await {
        tracing::error!(error = %e, "failed to run migrations");
        return None;
    }

    Some(pool)
}

// Periodic sweep so abandoned sessions are recycled even without client
// activity. Per-cycle errors are logged and swallowed; a missed cycle
// self-heals on the next tick.
fn spawn_reclaim_timer(db: PgPool) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(config::reclaim_interval());
        loop {
            ticker.tick().await;
            let use_case = ReclaimUseCase {
                clock: SystemClock,
                store: PostgresPoolStore { db: db.clone() },
                hook: NoopReclaimHook,
            };
            match use_case.execute().await {
                Ok(0) => {}
                Ok(freed) => tracing::info!(freed, "reclaimed expired visitor leases"),
                Err(e) => tracing::warn!(error = ?e, "reclaim sweep failed, retrying next cycle"),
            }
        }
    });
}

pub async fn run() {
    // Load .env locally; safe to ignore when not present.
    let _ = dotenvy::dotenv();
    init_tracing();

    let Some(db) = setup_db().await else {
        return;
    };

    spawn_reclaim_timer(db.clone());

    let state = AppState {
        db,
        lease_lifetime_seconds: config::lease_lifetime().as_secs(),
    };
    let app = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config::http_port()));

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(%addr, error = %e, "failed to bind");
            return;
        }
    };
    tracing::info!(%addr, "listening");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server error");
    }
}

// One-shot deployment command: ensure the pool holds `size` identities.
pub async fn run_init_pool(size: u32) {
    let _ = dotenvy::dotenv();
    init_tracing();

    let Some(db) = setup_db().await else {
        return;
    };

    let use_case = InitializePoolUseCase {
        store: PostgresPoolStore { db },
    };
    match use_case.execute(size).await {
        Ok(created) => println!("pool ready: {size} identities ({created} created)"),
        Err(e) => tracing::error!(error = ?e, "pool bootstrap failed"),
    }
}

// Admin command: run one reclaim sweep and report what it freed.
pub async fn run_reclaim() {
    let _ = dotenvy::dotenv();
    init_tracing();

    let Some(db) = setup_db().await else {
        return;
    };

    let use_case = ReclaimUseCase {
        clock: SystemClock,
        store: PostgresPoolStore { db },
        hook: NoopReclaimHook,
    };
    match use_case.execute().await {
        Ok(freed) => println!("reclaimed {freed} expired leases"),
        Err(e) => tracing::error!(error = ?e, "reclaim sweep failed"),
    }
}

// Admin command: print the pool counters.
pub async fn run_status() {
    let _ = dotenvy::dotenv();
    init_tracing();

    let Some(db) = setup_db().await else {
        return;
    };

    let use_case = PoolStatusUseCase {
        clock: SystemClock,
        store: PostgresPoolStore { db },
    };
    match use_case.execute().await {
        Ok(status) => println!(
            "total={} allocated={} free={} expired={}",
            status.total, status.allocated, status.free, status.expired
        ),
        Err(e) => tracing::error!(error = ?e, "status read failed"),
    }
}
