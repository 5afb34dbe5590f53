use rusqlite::Connection;
use worldwide_core::db::migrations::{latest_version, schema_version};
use worldwide_core::db::{open_db, open_db_in_memory, DbError, DATABASE_NAME};
use worldwide_core::{
    CityRepository, DocumentCityRepository, Gateway, GatewayConfig, NewCity, Position,
};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn).unwrap(), latest_version());
    assert_table_exists(&conn, "documents");
}

#[test]
fn opening_same_store_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("worldwide.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first).unwrap(), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second).unwrap(), latest_version());
    assert_table_exists(&conn_second, "documents");
}

#[test]
fn opening_store_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn connect_is_idempotent_and_shares_one_connection() {
    let mut gateway = Gateway::new(GatewayConfig::new("sqlite::memory:"));

    let first = gateway.connect().unwrap();
    let repo = DocumentCityRepository::new(&first);
    repo.create_city(&NewCity::new("Lisbon", "Portugal", Position::new(38.7, -9.1)))
        .unwrap();

    let second = gateway.connect().unwrap();
    assert_eq!(second.name(), DATABASE_NAME);
    assert_eq!(DocumentCityRepository::new(&second).count_cities().unwrap(), 1);
}

#[test]
fn handle_before_connect_is_not_connected() {
    let gateway = Gateway::new(GatewayConfig::new("sqlite::memory:"));

    assert!(!gateway.is_connected());
    assert!(matches!(gateway.handle(), Err(DbError::NotConnected)));
}

#[test]
fn connect_without_connection_string_fails() {
    let mut gateway = Gateway::new(GatewayConfig::default());

    let err = gateway.connect().unwrap_err();
    assert!(matches!(err, DbError::Connection { ref reason } if reason.contains("WORLDWIDE_DB_URI")));
    assert!(!gateway.is_connected());
}

#[test]
fn connect_with_malformed_connection_string_fails() {
    let mut gateway = Gateway::new(GatewayConfig::new("mongodb+srv://cluster0.example.net"));

    let err = gateway.connect().unwrap_err();
    assert!(matches!(err, DbError::Connection { .. }));
}

#[test]
fn connect_to_unreachable_store_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing-dir").join("worldwide.db");
    let mut gateway = Gateway::new(GatewayConfig::new(format!("sqlite://{}", path.display())));

    let err = gateway.connect().unwrap_err();
    assert!(matches!(err, DbError::Connection { .. }));
}

#[test]
fn close_is_idempotent_and_invalidates_handles() {
    let mut gateway = Gateway::new(GatewayConfig::new("sqlite::memory:"));
    gateway.close();

    let database = gateway.connect().unwrap();
    assert!(database.is_open());
    gateway.close();
    gateway.close();

    assert!(!database.is_open());
    assert!(matches!(gateway.handle(), Err(DbError::NotConnected)));
    let err = database.collection("cities").count_documents().unwrap_err();
    assert!(matches!(err, DbError::Closed));
}

#[test]
fn file_store_persists_across_gateways() {
    let dir = tempfile::tempdir().unwrap();
    let uri = format!("sqlite://{}", dir.path().join("worldwide.db").display());

    {
        let mut gateway = Gateway::new(GatewayConfig::new(uri.clone()));
        let repo = DocumentCityRepository::new(&gateway.connect().unwrap());
        repo.create_city(&NewCity::new("Berlin", "Germany", Position::new(52.5, 13.4)))
            .unwrap();
    }

    let mut gateway = Gateway::new(GatewayConfig::new(uri));
    let repo = DocumentCityRepository::new(&gateway.connect().unwrap());
    let cities = repo.list_cities().unwrap();
    assert_eq!(cities.len(), 1);
    assert_eq!(cities[0].city_name, "Berlin");
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
