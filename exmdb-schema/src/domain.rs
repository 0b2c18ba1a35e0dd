//! Public store of a domain.

use crate::catalog::{Column, Table};

pub(crate) fn tables() -> Vec<Table> {
    vec![
        Table::new("folders")
            .column(Column::integer("folder_id").primary_key())
            .column(Column::integer("parent_id").references("folders", "folder_id"))
            .column(Column::integer("change_number").not_null().unique())
            .column(Column::integer("is_deleted").default_value("0"))
            .column(Column::integer("cur_eid").not_null())
            .column(Column::integer("max_eid").not_null())
            .index("folder_delete_index", &["parent_id", "is_deleted"]),
        Table::new("messages")
            .column(Column::integer("message_id").primary_key())
            .column(
                Column::integer("parent_fid")
                    .references("folders", "folder_id")
                    .indexed(),
            )
            .column(
                Column::integer("parent_attid")
                    .references("attachments", "attachment_id")
                    .indexed(),
            )
            .column(Column::integer("is_deleted").default_value("0"))
            .column(Column::integer("is_associated").indexed())
            .column(Column::integer("change_number").not_null().unique())
            .column(Column::integer("message_size").not_null())
            .column(Column::integer("group_id"))
            .index(
                "parent_assoc_delete_index",
                &["parent_fid", "is_associated", "is_deleted"],
            ),
        Table::new("read_states")
            .column(read_message_ref())
            .column(Column::text("username").not_null().primary_key())
            .unique_index("state_username_index", &["message_id", "username"]),
        Table::new("read_cns")
            .column(read_message_ref())
            .column(Column::text("username").not_null().primary_key())
            .column(Column::integer("read_cn").not_null().primary_key().unique())
            .unique_index("readcn_username_index", &["message_id", "username"]),
        Table::new("replca_mapping")
            .autoincrement()
            .column(Column::integer("replid").primary_key())
            .column(Column::text("replguid").not_null().unique()),
    ]
}

fn read_message_ref() -> Column {
    Column::integer("message_id")
        .not_null()
        .primary_key()
        .references("messages", "message_id")
        .indexed()
}
