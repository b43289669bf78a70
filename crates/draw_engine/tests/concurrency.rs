//! Races on a file database, where every task gets its own connection.

mod common;

use std::path::PathBuf;

use rust_decimal::Decimal;

use draw_engine::{Account, DrawEngine, EngineConfig, Scope, Store};

use common::{balance, draw_day, issue, SHOP};

const TASKS: usize = 8;

/// A database file under the temp dir, removed with its WAL files on drop.
struct TempDb {
    path: PathBuf,
}

impl TempDb {
    fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!(
            "draw_engine-{}-{}.db",
            name,
            std::process::id()
        ));
        let db = Self { path };
        db.remove();
        db
    }

    fn url(&self) -> String {
        format!("sqlite://{}", self.path.display())
    }

    fn remove(&self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        self.remove();
    }
}

async fn file_engine(db: &TempDb) -> DrawEngine {
    let store = Store::connect(&db.url()).await.unwrap();
    let engine = DrawEngine::new(store, EngineConfig::default()).unwrap();
    engine
        .register_account(&Account {
            id: SHOP,
            balance: Decimal::from(10_000),
            commission: Decimal::from(10),
        })
        .await
        .unwrap();
    engine.set_payout_rate(Decimal::from(100)).await.unwrap();
    engine
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_claims_credit_once() {
    let db = TempDb::new("claims");
    let engine = file_engine(&db).await;
    let ticket_id = issue(&engine, Scope::Global, &["08:45 PM"], "10-05:2")
        .await
        .ticket
        .id;
    engine
        .trigger_draw(Scope::Global, "08:45 PM", Some(draw_day()))
        .await
        .unwrap();
    assert_eq!(balance(&engine, SHOP).await, Decimal::from(9_676));

    let handles: Vec<_> = (0..TASKS)
        .map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.submit_claim(ticket_id).await })
        })
        .collect();
    let mut labels = Vec::with_capacity(TASKS);
    for handle in handles {
        labels.push(handle.await.unwrap().unwrap().label());
    }

    assert_eq!(labels.iter().filter(|l| **l == "claimed").count(), 1);
    assert_eq!(
        labels.iter().filter(|l| **l == "already_claimed").count(),
        TASKS - 1
    );
    assert_eq!(balance(&engine, SHOP).await, Decimal::from(10_036));

    let today = chrono::Utc::now().date_naive();
    let history = engine.claims_between(today, today).await.unwrap();
    assert_eq!(history.len(), 1);

    engine.store().close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_triggers_declare_once() {
    let db = TempDb::new("triggers");
    let engine = file_engine(&db).await;
    issue(&engine, Scope::Global, &["08:45 PM"], "10-05:2,30-11:1").await;

    let handles: Vec<_> = (0..TASKS)
        .map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move {
                engine
                    .trigger_draw(Scope::Global, "08:45 PM", Some(draw_day()))
                    .await
            })
        })
        .collect();
    let mut outcomes = Vec::with_capacity(TASKS);
    for handle in handles {
        outcomes.push(handle.await.unwrap().unwrap());
    }

    let declared = outcomes.iter().filter(|o| o.label() == "declared").count();
    let repeated = outcomes
        .iter()
        .filter(|o| o.label() == "already_declared")
        .count();
    assert_eq!(declared, 1);
    assert_eq!(repeated, TASKS - 1);

    // Every caller sees the one stored result.
    let first = outcomes[0].result().unwrap();
    assert!(outcomes.iter().all(|o| o.result() == Some(first)));
    assert_eq!(engine.declared_results_on(draw_day()).await.unwrap().len(), 1);

    engine.store().close().await;
}
