//! Private store of a user.

use crate::catalog::{Column, Table};

pub(crate) fn tables() -> Vec<Table> {
    vec![
        Table::new("folders")
            .column(Column::integer("folder_id").primary_key())
            .column(Column::integer("parent_id").references("folders", "folder_id"))
            .column(Column::integer("change_number").not_null().unique())
            .column(Column::integer("is_search").default_value("0").indexed())
            .column(Column::integer("search_flags"))
            .column(Column::blob("search_criteria"))
            .column(Column::integer("cur_eid").not_null())
            .column(Column::integer("max_eid").not_null()),
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
            .column(Column::integer("is_associated").indexed())
            .column(Column::integer("change_number").not_null().unique())
            .column(Column::integer("read_cn").unique())
            .column(Column::integer("read_state").default_value("0"))
            .column(Column::integer("message_size").not_null())
            .column(Column::integer("group_id"))
            .column(Column::integer("timer_id"))
            .column(Column::plain_text("mid_string"))
            .index("parent_assoc_index", &["parent_fid", "is_associated"])
            .index(
                "parent_read_assoc_index",
                &["parent_fid", "read_state", "is_associated"],
            ),
        Table::new("receive_table")
            .column(Column::text("class").not_null().primary_key().unique())
            .column(folder_ref("folder_id"))
            .column(Column::integer("modified_time").not_null()),
        Table::new("search_scopes")
            .column(folder_ref("folder_id").primary_key())
            .column(folder_ref("included_fid").primary_key()),
        Table::new("search_result")
            .column(folder_ref("folder_id").primary_key())
            .column(
                Column::integer("message_id")
                    .not_null()
                    .primary_key()
                    .references("messages", "message_id")
                    .indexed(),
            )
            .unique_index("search_message_index", &["folder_id", "message_id"]),
    ]
}

fn folder_ref(name: &'static str) -> Column {
    Column::integer(name)
        .not_null()
        .references("folders", "folder_id")
        .indexed()
}
