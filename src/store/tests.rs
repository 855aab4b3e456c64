use super::*;

fn memory_store() -> Connection {
    let connection = Connection::open_in_memory().expect("in-memory sqlite");
    ensure_schema(&connection).expect("schema");
    connection
}

fn search(session_id: &str) -> SearchRecord {
    SearchRecord {
        user_id: "u1".to_string(),
        session_id: session_id.to_string(),
        query_text: "  wireless earbuds ".to_string(),
        result_count: 8,
        ts: None,
    }
}

fn impression(session_id: &str, variant: &str, placement: &str, creative: &str) -> ImpressionRecord {
    ImpressionRecord {
        user_id: "u1".to_string(),
        session_id: session_id.to_string(),
        variant: variant.to_string(),
        placement: placement.to_string(),
        creative_id: creative.to_string(),
        visible_ms: 1200,
        viewport_w: 1280,
        viewport_h: 720,
        ua: String::new(),
        ip: String::new(),
        ts: None,
    }
}

fn click(session_id: &str, variant: &str, placement: &str, creative: &str) -> ClickRecord {
    ClickRecord {
        user_id: "u1".to_string(),
        session_id: session_id.to_string(),
        variant: variant.to_string(),
        placement: placement.to_string(),
        creative_id: creative.to_string(),
        ua: String::new(),
        ip: String::new(),
        ts: None,
    }
}

#[test]
fn ensure_schema_is_idempotent_and_records_version() {
    let connection = memory_store();
    ensure_schema(&connection).expect("second schema pass");

    assert_eq!(
        schema_version(&connection).expect("version").as_deref(),
        Some(DB_SCHEMA_VERSION)
    );
    for table in EVENT_TABLES {
        assert_eq!(table_count(&connection, table).expect("count"), 0);
    }
}

#[test]
fn ensure_schema_adds_placement_to_legacy_tables() {
    let connection = Connection::open_in_memory().expect("in-memory sqlite");
    connection
        .execute_batch(
            "
            CREATE TABLE impressions (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              ts INTEGER, user_id TEXT, session_id TEXT,
              variant TEXT, creative_id TEXT, visible_ms INTEGER,
              viewport_w INTEGER, viewport_h INTEGER, ua TEXT, ip TEXT
            );
            INSERT INTO impressions(ts, user_id, session_id, variant, creative_id)
            VALUES(1, 'u1', 's1', 'A', 'c1');
            ",
        )
        .expect("legacy table");

    ensure_schema(&connection).expect("migration");

    let placement: Option<String> = connection
        .query_row("SELECT placement FROM impressions", [], |row| row.get(0))
        .expect("placement column");
    assert!(placement.is_none());
    insert_impression(&connection, &impression("s1", "A", "P1", "c1"), 2).expect("insert");
    assert_eq!(table_count(&connection, "impressions").expect("count"), 2);
}

#[test]
fn legacy_rows_without_placement_group_under_empty_placement() {
    let connection = Connection::open_in_memory().expect("in-memory sqlite");
    connection
        .execute_batch(
            "
            CREATE TABLE impressions (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              ts INTEGER, user_id TEXT, session_id TEXT,
              variant TEXT, creative_id TEXT, visible_ms INTEGER,
              viewport_w INTEGER, viewport_h INTEGER, ua TEXT, ip TEXT
            );
            CREATE TABLE clicks (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              ts INTEGER, user_id TEXT, session_id TEXT,
              variant TEXT, creative_id TEXT, ua TEXT, ip TEXT
            );
            INSERT INTO impressions(ts, user_id, session_id, variant, creative_id)
            VALUES(1, 'u1', 's1', 'A', 'c1'), (2, 'u1', 's1', 'A', 'c1');
            INSERT INTO clicks(ts, user_id, session_id, variant, creative_id)
            VALUES(3, 'u1', 's1', 'A', 'c1');
            ",
        )
        .expect("legacy tables");

    ensure_schema(&connection).expect("migration");
    insert_search(&connection, &search("s1"), 4).expect("search");

    let counts = grouped_counts(&connection).expect("grouped counts");
    assert_eq!(
        counts,
        vec![EventCount {
            variant: "A".to_string(),
            placement: String::new(),
            creative_id: "c1".to_string(),
            impressions: 2,
            clicks: 1,
        }]
    );
}

#[test]
fn open_existing_rejects_a_missing_database() {
    let path = std::env::temp_dir().join(format!(
        "ctrlab-missing-{}-{}.db",
        std::process::id(),
        crate::util::now_epoch_millis()
    ));
    let err = open_existing(&path).expect_err("missing database");
    assert!(err.to_string().contains("event database not found"), "{err:#}");
    assert!(!path.exists());
}

#[test]
fn users_and_sessions_are_insert_or_ignore() {
    let connection = memory_store();
    let user = UserRecord {
        user_id: "u1".to_string(),
        ua: "test-agent".to_string(),
        ts: None,
    };
    assert!(insert_user(&connection, &user, 1).expect("first insert"));
    assert!(!insert_user(&connection, &user, 2).expect("second insert"));

    let session = SessionRecord {
        user_id: "u1".to_string(),
        session_id: "s1".to_string(),
        referrer: String::new(),
        ts: None,
    };
    assert!(insert_session(&connection, &session, 1).expect("first insert"));
    assert!(!insert_session(&connection, &session, 2).expect("second insert"));

    assert_eq!(table_count(&connection, "users").expect("count"), 1);
    assert_eq!(table_count(&connection, "sessions").expect("count"), 1);
}

#[test]
fn search_query_text_is_trimmed() {
    let connection = memory_store();
    insert_search(&connection, &search("s1"), 1).expect("insert");

    let query_text: String = connection
        .query_row("SELECT query_text FROM searches", [], |row| row.get(0))
        .expect("row");
    assert_eq!(query_text, "wireless earbuds");
}

#[test]
fn grouped_counts_only_include_sessions_with_a_search() {
    let connection = memory_store();
    insert_search(&connection, &search("valid"), 1).expect("search");
    insert_search(&connection, &search("valid"), 2).expect("search");

    for _ in 0..3 {
        insert_impression(&connection, &impression("valid", "A", "P1", "c1"), 3).expect("imp");
    }
    insert_click(&connection, &click("valid", "A", "P1", "c1"), 4).expect("click");

    for _ in 0..5 {
        insert_impression(&connection, &impression("no-search", "A", "P1", "c1"), 3)
            .expect("imp");
        insert_click(&connection, &click("no-search", "A", "P1", "c1"), 4).expect("click");
    }

    let counts = grouped_counts(&connection).expect("grouped counts");
    assert_eq!(
        counts,
        vec![EventCount {
            variant: "A".to_string(),
            placement: "P1".to_string(),
            creative_id: "c1".to_string(),
            impressions: 3,
            clicks: 1,
        }]
    );
    assert_eq!(valid_session_count(&connection).expect("valid sessions"), 1);
}

#[test]
fn grouped_counts_left_join_clicks_and_sort_by_cell() {
    let connection = memory_store();
    insert_search(&connection, &search("s1"), 1).expect("search");

    insert_impression(&connection, &impression("s1", "B", "P1", "c1"), 2).expect("imp");
    insert_impression(&connection, &impression("s1", "A", "P2", "c2"), 2).expect("imp");
    insert_impression(&connection, &impression("s1", "A", "P2", "c1"), 2).expect("imp");
    insert_click(&connection, &click("s1", "A", "P2", "c1"), 3).expect("click");
    insert_click(&connection, &click("s1", "A", "P2", "c1"), 3).expect("click");
    // click-only group is dropped by the left join
    insert_click(&connection, &click("s1", "C", "P3", "c7"), 3).expect("click");

    let counts = grouped_counts(&connection).expect("grouped counts");
    let summary: Vec<(&str, &str, &str, u64, u64)> = counts
        .iter()
        .map(|count| {
            (
                count.variant.as_str(),
                count.placement.as_str(),
                count.creative_id.as_str(),
                count.impressions,
                count.clicks,
            )
        })
        .collect();

    assert_eq!(
        summary,
        vec![
            ("A", "P2", "c1", 1, 2),
            ("A", "P2", "c2", 1, 0),
            ("B", "P1", "c1", 1, 0),
        ]
    );
}

#[test]
fn valid_session_count_is_distinct() {
    let connection = memory_store();
    assert_eq!(valid_session_count(&connection).expect("empty"), 0);

    insert_search(&connection, &search("s1"), 1).expect("search");
    insert_search(&connection, &search("s1"), 2).expect("search");
    insert_search(&connection, &search("s2"), 3).expect("search");
    assert_eq!(valid_session_count(&connection).expect("count"), 2);
}

#[test]
fn table_count_rejects_unknown_tables() {
    let connection = memory_store();
    assert!(table_count(&connection, "metadata; DROP TABLE users").is_err());
}
