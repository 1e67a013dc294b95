//! The file-catalog fixture: five rows with known SHA-1 content checksums,
//! indexed by path. The same data is available through both adapters so
//! engine tests and end-to-end tests agree on expected digests.

use serde_json::{json, Value};

use rangesync_store::{MemoryDataset, Row, SqliteDataset};

/// Schema and rows for the catalog table.
pub const CATALOG_SQL: &str = r#"
    CREATE TABLE entry_path (
        path TEXT NOT NULL,
        inode_id INTEGER,
        mode INTEGER,
        last_event INTEGER,
        entry_type INTEGER,
        scanned INTEGER,
        options INTEGER,
        checksum TEXT NOT NULL,
        PRIMARY KEY(path)
    );
    INSERT INTO entry_path VALUES('/boot/grub2/fonts/unicode.pf2',1,0,1596489273,0,1,131583,'96482cde495f716fcd66a71a601fbb905c13b426');
    INSERT INTO entry_path VALUES('/boot/grub2/grubenv',2,0,1596489273,0,1,131583,'e041159610c7ec18490345af13f7f49371b56893');
    INSERT INTO entry_path VALUES('/boot/grub2/i386-pc/datehook.mod',3,0,1596489273,0,1,131583,'f83bc87319566e270fcece2fae4910bc18fe7355');
    INSERT INTO entry_path VALUES('/boot/grub2/i386-pc/gcry_whirlpool.mod',4,0,1596489273,0,1,131583,'d59ffd58d107b9398ff5a809097f056b903b3c3e');
    INSERT INTO entry_path VALUES('/boot/grub2/i386-pc/gzio.mod',5,0,1596489273,0,1,131583,'e4a541bdcf17cb5435064881a1616befdc71f871');
    CREATE INDEX path_index ON entry_path (path);
"#;

/// Open an in-memory SQLite dataset seeded with the catalog.
pub fn catalog_sqlite() -> SqliteDataset {
    let dataset = SqliteDataset::open_memory().expect("open in-memory database");
    dataset.execute_batch(CATALOG_SQL).expect("seed catalog");
    dataset
}

/// Build the equivalent in-memory dataset.
pub fn catalog_memory() -> MemoryDataset {
    let dataset = MemoryDataset::new("path");
    for row in catalog_rows() {
        dataset.insert(row).expect("catalog rows carry the index column");
    }
    dataset
}

fn catalog_rows() -> Vec<Row> {
    let entries = [
        ("/boot/grub2/fonts/unicode.pf2", 1, "96482cde495f716fcd66a71a601fbb905c13b426"),
        ("/boot/grub2/grubenv", 2, "e041159610c7ec18490345af13f7f49371b56893"),
        ("/boot/grub2/i386-pc/datehook.mod", 3, "f83bc87319566e270fcece2fae4910bc18fe7355"),
        ("/boot/grub2/i386-pc/gcry_whirlpool.mod", 4, "d59ffd58d107b9398ff5a809097f056b903b3c3e"),
        ("/boot/grub2/i386-pc/gzio.mod", 5, "e4a541bdcf17cb5435064881a1616befdc71f871"),
    ];
    entries
        .into_iter()
        .map(|(path, inode_id, checksum)| {
            match json!({
                "path": path,
                "inode_id": inode_id,
                "mode": 0,
                "last_event": 1596489273i64,
                "entry_type": 0,
                "scanned": 1,
                "options": 131583,
                "checksum": checksum,
            }) {
                Value::Object(map) => map,
                _ => unreachable!(),
            }
        })
        .collect()
}

/// Registration configuration for the catalog table under the default
/// component name `test_component`.
pub fn catalog_config() -> String {
    catalog_config_for("test_component")
}

/// Registration configuration for the catalog table under a caller-chosen
/// component name.
pub fn catalog_config_for(component: &str) -> String {
    catalog_config_with(component, "WHERE", "path")
}

/// A configuration SQLite rejects on every query: the range filters start
/// with a bad keyword and the dump selects a column that does not exist.
/// Registration still succeeds; the breakage only surfaces at query time.
pub fn broken_filter_config() -> String {
    catalog_config_with("test_component", "WHEREx", "pathx")
}

fn catalog_config_with(component: &str, where_keyword: &str, dump_column: &str) -> String {
    json!({
        "decoder_type": "JSON_RANGE",
        "table": "entry_path",
        "component": component,
        "index": "path",
        "last_event": "last_event",
        "checksum_field": "checksum",
        "no_data_query_json": {
            "row_filter": " ",
            "column_list": [format!("{dump_column}, inode_id, mode, last_event, entry_type, scanned, options, checksum")],
            "distinct_opt": false,
            "order_by_opt": "path"
        },
        "count_range_query_json": {
            "row_filter": format!("{where_keyword} path BETWEEN '?' and '?' ORDER BY path"),
            "count_field_name": "count",
            "column_list": ["count(*) AS count "],
            "distinct_opt": false,
            "order_by_opt": ""
        },
        "row_data_query_json": {
            "row_filter": format!("{where_keyword} path ='?'"),
            "column_list": ["path, inode_id, mode, last_event, entry_type, scanned, options, checksum"],
            "distinct_opt": false,
            "order_by_opt": ""
        },
        "range_checksum_query_json": {
            "row_filter": format!("{where_keyword} path BETWEEN '?' and '?' ORDER BY path"),
            "column_list": ["path, inode_id, mode, last_event, entry_type, scanned, options, checksum"],
            "distinct_opt": false,
            "order_by_opt": ""
        }
    })
    .to_string()
}
