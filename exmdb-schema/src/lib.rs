//! # exmdb-schema
//!
//! SQLite schema catalog for the stores served by exmdb.
//!
//! Two variants exist: the public store of a domain and the private store of
//! a user. Both share a common set of property and bookkeeping tables. The
//! catalog only describes tables; it never opens a database or migrates one.
//!
//! ```
//! use exmdb_schema::Schema;
//!
//! let script = Schema::domain().ddl_script();
//! assert!(script.starts_with("CREATE TABLE"));
//! ```

pub mod blob;
pub mod catalog;
mod common;
mod domain;
pub mod error;
mod user;

pub use blob::{ConfigurationRow, FolderPropertyRow, StorePropertyRow, ToBlob};
pub use catalog::{Column, ForeignKey, Index, Schema, SqlType, Table, Variant};
pub use error::SchemaError;

impl Schema {
    /// Catalog of a domain's public store.
    pub fn domain() -> Self {
        let mut tables = common::tables();
        tables.extend(domain::tables());
        Schema::new_unchecked(Variant::Domain, tables)
    }

    /// Catalog of a user's private store.
    pub fn user() -> Self {
        let mut tables = common::tables();
        tables.extend(user::tables());
        Schema::new_unchecked(Variant::User, tables)
    }

    pub fn for_variant(variant: Variant) -> Self {
        match variant {
            Variant::Domain => Self::domain(),
            Variant::User => Self::user(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::{params, Connection};

    const SHARED_TABLES: &[&str] = &[
        "configurations",
        "allocated_eids",
        "named_properties",
        "store_properties",
        "folder_properties",
        "permissions",
        "rules",
        "message_properties",
        "message_changes",
        "recipients",
        "recipients_properties",
        "attachments",
        "attachment_properties",
        "folders",
        "messages",
    ];

    fn names(schema: &Schema) -> Vec<&'static str> {
        schema.tables().iter().map(|t| t.name).collect()
    }

    #[test]
    fn test_catalogs_are_valid() {
        assert!(Schema::domain().validate().is_ok());
        assert!(Schema::user().validate().is_ok());
    }

    #[test]
    fn test_domain_tables() {
        let schema = Schema::domain();
        let names = names(&schema);
        for table in SHARED_TABLES {
            assert!(names.contains(table), "missing {table}");
        }
        for table in ["read_states", "read_cns", "replca_mapping"] {
            assert!(names.contains(&table), "missing {table}");
        }
        assert!(!names.contains(&"receive_table"));
        assert_eq!(names.len(), 18);
    }

    #[test]
    fn test_user_tables() {
        let schema = Schema::user();
        let names = names(&schema);
        for table in SHARED_TABLES {
            assert!(names.contains(table), "missing {table}");
        }
        for table in ["receive_table", "search_scopes", "search_result"] {
            assert!(names.contains(&table), "missing {table}");
        }
        assert!(!names.contains(&"read_states"));
        assert_eq!(names.len(), 18);
    }

    #[test]
    fn test_variant_column_differences() {
        let domain = Schema::domain();
        let user = Schema::user();

        let folders = domain.table("folders").unwrap();
        assert!(folders.get_column("is_deleted").is_some());
        assert!(folders.get_column("is_search").is_none());

        let folders = user.table("folders").unwrap();
        assert!(folders.get_column("is_deleted").is_none());
        let is_search = folders.get_column("is_search").unwrap();
        assert_eq!(is_search.default, Some("0"));
        assert!(is_search.indexed);

        let messages = user.table("messages").unwrap();
        for column in ["read_cn", "read_state", "timer_id", "mid_string"] {
            assert!(messages.get_column(column).is_some(), "missing {column}");
        }
        assert!(messages.get_column("is_deleted").is_none());
        assert!(messages.get_column("read_cn").unwrap().unique);
    }

    #[test]
    fn test_named_indexes() {
        let domain = Schema::domain();
        let index = domain
            .table("folder_properties")
            .unwrap()
            .indexes
            .iter()
            .find(|i| i.name == "folder_property_index")
            .cloned()
            .unwrap();
        assert!(index.unique);
        assert_eq!(index.columns, vec!["folder_id", "proptag"]);

        let ddl = domain.ddl();
        assert!(ddl.contains(
            &"CREATE UNIQUE INDEX folder_property_index ON folder_properties (folder_id, proptag)"
                .to_string()
        ));
        assert!(ddl.contains(
            &"CREATE INDEX proptag_propval_index ON message_properties (proptag, propval)"
                .to_string()
        ));
        assert!(ddl.contains(
            &"CREATE INDEX ix_allocated_eids_allocate_time ON allocated_eids (allocate_time)"
                .to_string()
        ));
    }

    #[test]
    fn test_user_search_result_index() {
        let ddl = Schema::user().ddl();
        assert!(ddl.contains(
            &"CREATE UNIQUE INDEX search_message_index ON search_result (folder_id, message_id)"
                .to_string()
        ));
    }

    #[test]
    fn test_for_variant() {
        assert_eq!(Schema::for_variant(Variant::User), Schema::user());
        assert_eq!(Schema::for_variant(Variant::Domain).variant(), Variant::Domain);
    }

    // Generated DDL executed against SQLite

    fn open(schema: &Schema) -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        conn.execute_batch(&schema.ddl_script()).unwrap();
        conn
    }

    fn count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
            row.get(0)
        })
        .unwrap()
    }

    #[test]
    fn test_folders_precede_referrers() {
        for schema in [Schema::domain(), Schema::user()] {
            let order: Vec<&str> = schema.creation_order().iter().map(|t| t.name).collect();
            let folders = order.iter().position(|&n| n == "folders").unwrap();

            for table in schema.tables() {
                let position = order.iter().position(|&n| n == table.name).unwrap();
                for dep in table.dependencies() {
                    let dep_position = order.iter().position(|&n| n == dep).unwrap();
                    if dep == "folders" {
                        assert!(folders < position, "{} before folders", table.name);
                    }
                    // messages -> attachments is the one reference emitted backwards
                    if (table.name, dep) != ("messages", "attachments") {
                        assert!(
                            dep_position < position,
                            "{} emitted before {}",
                            table.name,
                            dep
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_every_reference_cascades() {
        for variant in [Variant::Domain, Variant::User] {
            let script = Schema::for_variant(variant).ddl_script();
            let references: Vec<&str> = script
                .lines()
                .filter(|line| line.contains("REFERENCES"))
                .collect();
            assert!(!references.is_empty());
            for line in references {
                assert!(
                    line.contains("ON DELETE CASCADE ON UPDATE CASCADE"),
                    "{variant}: {line}"
                );
            }
        }
    }

    #[test]
    fn test_user_schema_executes() {
        let conn = open(&Schema::user());
        conn.execute(
            "INSERT INTO folders (folder_id, parent_id, change_number, cur_eid, max_eid) VALUES (1, NULL, 1, 1, 100)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO receive_table (class, folder_id, modified_time) VALUES ('IPM', 1, 0)",
            [],
        )
        .unwrap();
        // Collation is case-insensitive, so this collides with 'IPM'
        assert!(conn
            .execute(
                "INSERT INTO receive_table (class, folder_id, modified_time) VALUES ('ipm', 1, 0)",
                [],
            )
            .is_err());

        let is_search: i64 = conn
            .query_row("SELECT is_search FROM folders WHERE folder_id = 1", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(is_search, 0);
    }

    #[test]
    fn test_user_folder_delete_cascades() {
        let conn = open(&Schema::user());
        conn.execute_batch(
            "
            INSERT INTO folders (folder_id, parent_id, change_number, cur_eid, max_eid) VALUES (1, NULL, 1, 1, 100);
            INSERT INTO folders (folder_id, parent_id, change_number, is_search, cur_eid, max_eid) VALUES (2, 1, 2, 1, 101, 200);
            INSERT INTO messages (message_id, parent_fid, change_number, message_size) VALUES (10, 1, 3, 512);
            INSERT INTO receive_table (class, folder_id, modified_time) VALUES ('IPM.Note', 1, 0);
            INSERT INTO search_scopes (folder_id, included_fid) VALUES (2, 1);
            INSERT INTO search_result (folder_id, message_id) VALUES (2, 10);
            ",
        )
        .unwrap();

        let dependent = ["messages", "receive_table", "search_scopes", "search_result"];
        for table in dependent {
            assert!(count(&conn, table) > 0, "{table} not populated");
        }

        conn.execute("DELETE FROM folders WHERE folder_id = 1", [])
            .unwrap();

        assert_eq!(count(&conn, "folders"), 0);
        for table in dependent {
            assert_eq!(count(&conn, table), 0, "{table} not cascaded");
        }
    }

    #[test]
    fn test_folder_property_index_is_unique() {
        let conn = open(&Schema::domain());
        conn.execute(
            "INSERT INTO folders (folder_id, change_number, cur_eid, max_eid) VALUES (1, 1, 1, 100)",
            [],
        )
        .unwrap();

        let row = FolderPropertyRow::new(1, 0x3001_001F, "Root");
        let insert = |row: &FolderPropertyRow| {
            conn.execute(
                FolderPropertyRow::INSERT,
                params![row.folder_id as i64, row.proptag, row.propval],
            )
        };
        insert(&row).unwrap();
        assert!(insert(&row).is_err());
    }

    #[test]
    fn test_property_rows_store_blobs() {
        let conn = open(&Schema::domain());

        let config = ConfigurationRow::new(1, 42u32);
        conn.execute(
            ConfigurationRow::INSERT,
            params![config.config_id, config.config_value],
        )
        .unwrap();
        let store = StorePropertyRow::new(0x3001_001F, "Public Folders");
        conn.execute(StorePropertyRow::INSERT, params![store.proptag, store.propval])
            .unwrap();

        let value: Vec<u8> = conn
            .query_row(
                "SELECT config_value FROM configurations WHERE config_id = 1",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(value, b"42");
    }

    #[test]
    fn test_folder_delete_cascades() {
        let conn = open(&Schema::domain());
        conn.execute_batch(
            "
            INSERT INTO folders (folder_id, parent_id, change_number, cur_eid, max_eid) VALUES (1, NULL, 1, 1, 100);
            INSERT INTO folders (folder_id, parent_id, change_number, cur_eid, max_eid) VALUES (2, 1, 2, 101, 200);
            INSERT INTO folder_properties (folder_id, proptag, propval) VALUES (2, 805371935, x'6869');
            INSERT INTO permissions (folder_id, username, permission) VALUES (2, 'user@example.com', 2043);
            INSERT INTO rules (provider, sequence, state, condition, actions, folder_id) VALUES ('RuleOrganizer', 1, 1, x'00', x'00', 2);
            INSERT INTO messages (message_id, parent_fid, change_number, message_size) VALUES (10, 2, 3, 512);
            INSERT INTO message_properties (message_id, proptag, propval) VALUES (10, 805371935, x'6869');
            INSERT INTO message_changes (message_id, change_number, indices, proptags) VALUES (10, 3, x'00', x'00');
            INSERT INTO recipients (recipient_id, message_id) VALUES (20, 10);
            INSERT INTO recipients_properties (recipient_id, proptag, propval) VALUES (20, 973013023, x'6869');
            INSERT INTO attachments (attachment_id, message_id) VALUES (30, 10);
            INSERT INTO attachment_properties (attachment_id, proptag, propval) VALUES (30, 923271426, x'00');
            INSERT INTO messages (message_id, parent_attid, change_number, message_size) VALUES (11, 30, 4, 64);
            INSERT INTO read_states (message_id, username) VALUES (10, 'user@example.com');
            INSERT INTO read_cns (message_id, username, read_cn) VALUES (10, 'user@example.com', 5);
            ",
        )
        .unwrap();

        let dependent = [
            "folder_properties",
            "permissions",
            "rules",
            "messages",
            "message_properties",
            "message_changes",
            "recipients",
            "recipients_properties",
            "attachments",
            "attachment_properties",
            "read_states",
            "read_cns",
        ];
        for table in dependent {
            assert!(count(&conn, table) > 0, "{table} not populated");
        }

        conn.execute("DELETE FROM folders WHERE folder_id = 1", [])
            .unwrap();

        assert_eq!(count(&conn, "folders"), 0);
        for table in dependent {
            assert_eq!(count(&conn, table), 0, "{table} not cascaded");
        }
    }
}
