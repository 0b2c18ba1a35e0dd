//! Command execution.

use crate::Commands;
use colored::Colorize;
use exmdb_client::{Client, ClientError};
use exmdb_protocol::constants::proptags;
use exmdb_protocol::request::{
    AllocateCnRequest, CreateFolderByPropertiesRequest, DeleteFolderRequest,
    LoadHierarchyTableRequest, LoadPermissionTableRequest, LoadTableResponse,
    QueryTableRequest, UnloadTableRequest,
};
use exmdb_protocol::util::datetime_to_filetime;
use exmdb_protocol::{PropValue, TaggedPropval};
use exmdb_schema::{Schema, Variant};

/// Generic folder, as opposed to a search folder.
const FOLDER_GENERIC: u32 = 1;

const HIERARCHY_COLUMNS: &[u32] = &[
    proptags::FOLDERID,
    proptags::DISPLAYNAME,
    proptags::CONTAINERCLASS,
    proptags::CONTENTCOUNT,
    proptags::SUBFOLDERS,
];

const PERMISSION_COLUMNS: &[u32] = &[
    proptags::MEMBERID,
    proptags::MEMBERNAME,
    proptags::SMTPADDRESS,
    proptags::MEMBERRIGHTS,
];

/// Renders the DDL script of a store variant.
pub fn schema(variant: Variant) -> String {
    Schema::for_variant(variant).ddl_script()
}

/// Executes a command and returns the formatted output.
pub async fn execute(
    client: &mut Client,
    cmd: Commands,
) -> Result<String, Box<dyn std::error::Error>> {
    match cmd {
        Commands::Schema { .. } => Err("schema output does not need a connection".into()),

        Commands::Connect => Ok(format!(
            "{} to {}\n  Session: {}\n  Prefix: {}\n  Private: {}",
            "Connected".green(),
            client.config().addr().cyan(),
            client.session_id().unwrap_or("?"),
            client.prefix().unwrap_or("?"),
            client.private().unwrap_or_default()
        )),

        Commands::AllocateCn { homedir } => {
            let cn = client.send(&AllocateCnRequest::new(&homedir)).await?;
            Ok(format!("{} change number {}", "Allocated".green(), cn))
        }

        Commands::Hierarchy {
            homedir,
            folder_id,
            flags,
            json,
        } => {
            let table = client
                .send(&LoadHierarchyTableRequest::new(&homedir, folder_id, flags))
                .await?;
            let rows = fetch_rows(client, &homedir, table, HIERARCHY_COLUMNS).await?;
            if json {
                return Ok(serde_json::to_string_pretty(&rows)?);
            }
            if rows.is_empty() {
                return Ok("No subfolders".yellow().to_string());
            }
            Ok(format_rows(&rows))
        }

        Commands::Permissions {
            homedir,
            folder_id,
            json,
        } => {
            let table = client
                .send(&LoadPermissionTableRequest::new(&homedir, folder_id, 0))
                .await?;
            let rows = fetch_rows(client, &homedir, table, PERMISSION_COLUMNS).await?;
            if json {
                return Ok(serde_json::to_string_pretty(&rows)?);
            }
            if rows.is_empty() {
                return Ok("No permissions".yellow().to_string());
            }
            Ok(format_rows(&rows))
        }

        Commands::CreateFolder {
            homedir,
            parent,
            name,
            class,
            comment,
        } => {
            let change_number = client.send(&AllocateCnRequest::new(&homedir)).await?;
            let now = datetime_to_filetime(chrono::Utc::now());

            let mut propvals = vec![
                TaggedPropval::new(proptags::PARENTFOLDERID, PropValue::LongLong(parent)),
                TaggedPropval::new(proptags::FOLDERTYPE, PropValue::Long(FOLDER_GENERIC)),
                TaggedPropval::new(proptags::DISPLAYNAME, PropValue::WString(name.clone())),
                TaggedPropval::new(proptags::CONTAINERCLASS, PropValue::WString(class)),
                TaggedPropval::new(proptags::CREATIONTIME, PropValue::FileTime(now)),
                TaggedPropval::new(proptags::LASTMODIFICATIONTIME, PropValue::FileTime(now)),
                TaggedPropval::new(proptags::CHANGENUMBER, PropValue::LongLong(change_number)),
            ];
            if let Some(comment) = comment {
                propvals.push(TaggedPropval::new(
                    proptags::COMMENT,
                    PropValue::WString(comment),
                ));
            }

            let folder_id = client
                .send(&CreateFolderByPropertiesRequest::new(&homedir, 0, propvals))
                .await?;
            if folder_id == 0 {
                return Ok(format!("{} folder {}", "Not created".yellow(), name.cyan()));
            }
            Ok(format!(
                "{} folder {} (id: {})",
                "Created".green(),
                name.cyan(),
                folder_id
            ))
        }

        Commands::DeleteFolder { homedir, folder_id } => {
            let deleted = client
                .send(&DeleteFolderRequest::new(&homedir, 0, folder_id))
                .await?;
            if deleted {
                Ok(format!("{} folder {}", "Deleted".green(), folder_id))
            } else {
                Ok(format!("{} folder {}", "Not deleted".yellow(), folder_id))
            }
        }
    }
}

/// Reads every row of a loaded table and releases it.
async fn fetch_rows(
    client: &mut Client,
    homedir: &str,
    table: LoadTableResponse,
    columns: &[u32],
) -> Result<Vec<Vec<TaggedPropval>>, ClientError> {
    tracing::debug!(
        "Reading {} rows from table {}",
        table.row_count,
        table.table_id
    );
    let query = QueryTableRequest::new(
        homedir,
        0,
        table.table_id,
        columns.to_vec(),
        0,
        table.row_count,
    );
    let result = client.send(&query).await;
    client
        .send(&UnloadTableRequest::new(homedir, table.table_id))
        .await?;
    Ok(result?.rows)
}

fn format_rows(rows: &[Vec<TaggedPropval>]) -> String {
    let mut output = String::new();
    for (index, row) in rows.iter().enumerate() {
        output.push_str(&format!("{}\n", format!("Row {}", index).bold()));
        for propval in row {
            output.push_str(&format!("  {}\n", propval));
        }
    }
    output
}
