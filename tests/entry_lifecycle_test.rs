//! 入口生命周期测试：启动、执行、健康检查与中断
//!
//! 使用临时目录中的SQLite，不依赖外部数据库

use parking_lot::Mutex;
use rat_dbentry::*;
use std::sync::Arc;

fn recording_context() -> (AppContext, Arc<Mutex<Vec<String>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = seen.clone();
    let ctx = AppContext::with_deployment(Deployment::default()).with_shutdown_hook(Arc::new(
        move |err: &EntryError| {
            recorder.lock().push(err.to_string());
        },
    ));
    (ctx, seen)
}

#[tokio::test]
async fn test_sqlite_full_lifecycle() {
    println!("🚀 测试SQLite入口完整生命周期");
    let dir = tempfile::tempdir().unwrap();
    let raw = format!(
        r#"
sqlite:
  - name: local
    enabled: true
    database:
      - name: user
        autoCreate: true
        dbDir: '{}'
        plugins:
          prom:
            enabled: true
"#,
        dir.path().join("data").display()
    );

    let (ctx, seen) = recording_context();
    let entries = register_sqlite_entries_yaml(&ctx, raw.as_bytes());
    assert_eq!(entries.len(), 1);

    let entry = get_sqlite_entry(&ctx, "local").unwrap();
    assert!(entry.get_db("user").is_none());

    entry.bootstrap(Some("event-1")).await;
    assert!(seen.lock().is_empty(), "unexpected fatal: {:?}", seen.lock());
    assert_eq!(entry.state(), EntryState::Bootstrapped);
    assert_eq!(entry.database_names(), vec!["user".to_string()]);
    assert!(dir.path().join("data").join("user.db").exists());

    let db = entry.get_db("user").unwrap();
    assert!(!db.is_dry_run());
    db.execute("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)")
        .await
        .unwrap();
    let rows = db
        .execute("INSERT INTO users (name) VALUES ('alice'), ('bob')")
        .await
        .unwrap();
    assert_eq!(rows, 2);
    assert!(db.execute("INSERT INTO missing VALUES (1)").await.is_err());

    assert!(entry.is_healthy().await);

    let samples = entry.metrics();
    let insert = samples.iter().find(|s| s.operation == "insert").unwrap();
    assert_eq!(insert.count, 2);
    assert_eq!(insert.errors, 1);
    assert_eq!(insert.db_name, "user");

    entry.interrupt(Some("event-2")).await;
    assert_eq!(entry.state(), EntryState::Interrupted);
    assert!(entry.get_db("user").is_none());
    assert!(db.is_closed());

    // 重复中断没有副作用
    entry.interrupt(None).await;
    assert!(seen.lock().is_empty());
    println!("✅ 生命周期测试通过");
}

#[tokio::test]
async fn test_in_memory_sqlite() {
    let (ctx, seen) = recording_context();
    let entry = SqliteEntry::register(
        &ctx,
        EntryOptions::new()
            .name("memory")
            .database("cache", false, false, Vec::<String>::new())
            .in_memory("cache", true),
    )
    .unwrap();

    entry.bootstrap(None).await;
    assert!(seen.lock().is_empty());

    let db = entry.get_db("cache").unwrap();
    db.execute("CREATE TABLE kv (k TEXT, v TEXT)").await.unwrap();
    assert!(entry.is_healthy().await);

    entry.interrupt(None).await;
}

#[tokio::test]
async fn test_dry_run_never_connects() {
    println!("🔍 测试演练模式");
    let dir = tempfile::tempdir().unwrap();
    let (ctx, seen) = recording_context();

    let entry = SqliteEntry::register(
        &ctx,
        EntryOptions::new()
            .name("dry")
            .database("user", true, true, Vec::<String>::new())
            .db_dir("user", dir.path().join("never")),
    )
    .unwrap();

    entry.bootstrap(None).await;
    assert!(seen.lock().is_empty());

    let db = entry.get_db("user").unwrap();
    assert!(db.is_dry_run());
    assert_eq!(db.pool().size(), 0);
    assert_eq!(db.execute("DELETE FROM users").await.unwrap(), 0);
    assert_eq!(db.pool().size(), 0);
    assert!(entry.is_healthy().await);

    // 演练模式不建库
    assert!(!dir.path().join("never").exists());

    entry.interrupt(None).await;
    println!("✅ 演练模式没有建立连接");
}

#[tokio::test]
async fn test_statement_logging() {
    let dir = tempfile::tempdir().unwrap();
    let (ctx, _) = recording_context();

    let sink = Arc::new(MemorySink::new());
    ctx.add_logger_entry(LoggerEntry::new("memory", sink.clone()));

    let raw = format!(
        r#"
sqlite:
  - name: logged
    enabled: true
    logger:
      entry: memory
      level: info
    database:
      - name: user
        dbDir: '{}'
"#,
        dir.path().display()
    );
    register_sqlite_entries_yaml(&ctx, raw.as_bytes());
    let entry = get_sqlite_entry(&ctx, "logged").unwrap();

    entry.bootstrap(Some("boot-1")).await;
    let records = sink.records();
    let boot = records
        .iter()
        .find(|r| r.message == "Bootstrap SqliteEntry")
        .unwrap();
    assert_eq!(boot.field("eventId"), Some("boot-1"));
    assert_eq!(boot.field("entryName"), Some("logged"));

    sink.clear();
    let db = entry.get_db("user").unwrap();
    db.execute("CREATE TABLE t (id INTEGER)").await.unwrap();

    let records = sink.records();
    let statement = records.iter().find(|r| r.message == "sql").unwrap();
    assert_eq!(statement.field("database"), Some("user"));
    assert_eq!(statement.field("sql"), Some("CREATE TABLE t (id INTEGER)"));

    entry.interrupt(None).await;
    assert!(
        sink.records()
            .iter()
            .any(|r| r.message == "Interrupt SqliteEntry")
    );
}

#[tokio::test]
async fn test_connect_failure_reaches_shutdown_hook() {
    println!("🔍 测试连接失败");
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"file").unwrap();

    let (ctx, seen) = recording_context();
    let entry = SqliteEntry::register(
        &ctx,
        EntryOptions::new()
            .name("broken")
            .database("ok", false, false, Vec::<String>::new())
            .in_memory("ok", true)
            .database("bad", false, false, Vec::<String>::new())
            .db_dir("bad", &blocker)
            .database("never", false, false, Vec::<String>::new())
            .in_memory("never", true),
    )
    .unwrap();

    entry.bootstrap(None).await;

    let fatal = seen.lock().clone();
    println!("🔍 {:?}", fatal);
    assert_eq!(fatal.len(), 1);
    assert!(fatal[0].contains("failed to connect to database at"));

    // 失败前建立的连接保留，之后的不再尝试
    assert!(entry.get_db("ok").is_some());
    assert!(entry.get_db("bad").is_none());
    assert!(entry.get_db("never").is_none());

    entry.interrupt(None).await;
    assert!(entry.database_names().is_empty());
}

#[tokio::test]
async fn test_closed_pool_reports_unhealthy() {
    println!("🔍 测试连接池关闭后的健康检查");
    let (ctx, seen) = recording_context();
    let entry = SqliteEntry::register(
        &ctx,
        EntryOptions::new()
            .name("health")
            .database("user", false, false, Vec::<String>::new())
            .in_memory("user", true)
            .database("order", false, false, Vec::<String>::new())
            .in_memory("order", true),
    )
    .unwrap();

    entry.bootstrap(None).await;
    assert!(seen.lock().is_empty());
    assert!(entry.is_healthy().await);

    entry.get_db("user").unwrap().close().await;
    assert!(!entry.is_healthy().await);

    // 另一个库不受影响
    let order = entry.get_db("order").unwrap();
    assert!(order.ping().await.is_ok());

    entry.interrupt(None).await;
    println!("✅ 关闭的连接池被判定为不健康");
}

#[tokio::test]
async fn test_same_name_descriptor_keeps_its_own_dry_run() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"file").unwrap();

    let (ctx, seen) = recording_context();
    let entry = SqliteEntry::register(
        &ctx,
        EntryOptions::new()
            .name("twice")
            .database("user", true, false, Vec::<String>::new())
            .database("user", false, false, Vec::<String>::new())
            .db_dir("user", &blocker),
    )
    .unwrap();

    // 同名配置以最后一次为准，是真实连接
    assert!(!entry.configs()["user"].dry_run);

    entry.bootstrap(None).await;
    assert_eq!(seen.lock().len(), 1);

    // 第一条声明建立的句柄仍是演练模式
    let db = entry.get_db("user").unwrap();
    assert!(db.is_dry_run());
    assert_eq!(db.pool().size(), 0);
    assert_eq!(db.execute("DELETE FROM users").await.unwrap(), 0);

    entry.interrupt(None).await;
}

#[cfg(feature = "postgres-support")]
#[tokio::test]
async fn test_unreachable_postgres_redacts_password() {
    let (ctx, seen) = recording_context();
    let entry = PostgresEntry::register(
        &ctx,
        EntryOptions::new()
            .name("unreachable")
            .user("admin")
            .pass("supersecret")
            .addr("127.0.0.1:1")
            .database("user", false, true, Vec::<String>::new()),
    )
    .unwrap();

    entry.bootstrap(None).await;

    let fatal = seen.lock().clone();
    assert_eq!(fatal.len(), 1);
    assert!(fatal[0].contains("failed to connect to database at admin:****@127.0.0.1:1"));
    assert!(!fatal[0].contains("supersecret"));
}

#[tokio::test]
async fn test_context_bootstrap_and_interrupt_all() {
    let (ctx, seen) = recording_context();

    for name in ["a", "b"] {
        SqliteEntry::register(
            &ctx,
            EntryOptions::new()
                .name(name)
                .database("main", false, false, Vec::<String>::new())
                .in_memory("main", true),
        )
        .unwrap();
    }

    ctx.bootstrap_all(None).await;
    assert!(seen.lock().is_empty());

    let health = ctx.health().await;
    assert_eq!(health.len(), 2);
    assert!(health.iter().all(|(_, _, ok)| *ok));

    ctx.interrupt_all(None).await;
    for name in ["a", "b"] {
        let entry = get_sqlite_entry(&ctx, name).unwrap();
        assert_eq!(entry.state(), EntryState::Interrupted);
    }
}
