//! Tables present in both store variants.
//!
//! `folders` and `messages` differ per variant and are declared there.

use crate::catalog::{Column, Table};

pub(crate) fn tables() -> Vec<Table> {
    vec![
        Table::new("configurations")
            .column(Column::integer("config_id").primary_key())
            .column(Column::blob("config_value").not_null()),
        Table::new("allocated_eids")
            .column(Column::integer("range_begin").not_null().primary_key())
            .column(Column::integer("range_end").not_null().primary_key())
            .column(
                Column::integer("allocate_time")
                    .not_null()
                    .primary_key()
                    .indexed(),
            )
            .column(Column::integer("is_system").primary_key()),
        Table::new("named_properties")
            .autoincrement()
            .column(Column::integer("propid").primary_key())
            .column(Column::text("name_string").not_null()),
        Table::new("store_properties")
            .column(Column::integer("proptag").not_null().primary_key().unique())
            .column(Column::blob("propval").not_null()),
        Table::new("folder_properties")
            .column(
                Column::integer("folder_id")
                    .not_null()
                    .primary_key()
                    .references("folders", "folder_id")
                    .indexed(),
            )
            .column(Column::integer("proptag").not_null().primary_key())
            .column(Column::blob("propval").not_null())
            .unique_index("folder_property_index", &["folder_id", "proptag"]),
        Table::new("permissions")
            .autoincrement()
            .column(Column::integer("member_id").not_null().primary_key())
            .column(
                Column::integer("folder_id")
                    .not_null()
                    .references("folders", "folder_id")
                    .indexed(),
            )
            .column(Column::text("username").not_null())
            .column(Column::integer("permission").not_null())
            .unique_index("folder_username_index", &["folder_id", "username"]),
        Table::new("rules")
            .autoincrement()
            .column(Column::integer("rule_id").primary_key())
            .column(Column::text("name"))
            .column(Column::text("provider").not_null())
            .column(Column::integer("sequence").not_null())
            .column(Column::integer("state").not_null())
            .column(Column::integer("level"))
            .column(Column::integer("user_flags"))
            .column(Column::blob("provider_data"))
            .column(Column::blob("condition").not_null())
            .column(Column::blob("actions").not_null())
            .column(
                Column::integer("folder_id")
                    .not_null()
                    .references("folders", "folder_id")
                    .indexed(),
            ),
        Table::new("message_properties")
            .column(message_ref().primary_key())
            .column(Column::integer("proptag").not_null().primary_key())
            .column(Column::blob("propval").not_null())
            .unique_index("message_property_index", &["message_id", "proptag"])
            .index("proptag_propval_index", &["proptag", "propval"]),
        Table::new("message_changes")
            .column(message_ref().primary_key())
            .column(Column::integer("change_number").not_null().primary_key())
            .column(Column::blob("indices").not_null())
            .column(Column::blob("proptags").not_null()),
        Table::new("recipients")
            .autoincrement()
            .column(Column::integer("recipient_id").primary_key())
            .column(message_ref()),
        Table::new("recipients_properties")
            .column(
                Column::integer("recipient_id")
                    .not_null()
                    .primary_key()
                    .references("recipients", "recipient_id")
                    .indexed(),
            )
            .column(Column::integer("proptag").not_null().primary_key())
            .column(Column::blob("propval").not_null())
            .unique_index("recipient_property_index", &["recipient_id", "proptag"]),
        Table::new("attachments")
            .autoincrement()
            .column(Column::integer("attachment_id").primary_key())
            .column(message_ref()),
        Table::new("attachment_properties")
            .column(
                Column::integer("attachment_id")
                    .not_null()
                    .primary_key()
                    .references("attachments", "attachment_id")
                    .indexed(),
            )
            .column(Column::integer("proptag").not_null().primary_key())
            .column(Column::blob("propval").not_null())
            .unique_index("attachment_property_index", &["attachment_id", "proptag"]),
    ]
}

/// Indexed, non-null `message_id` reference.
fn message_ref() -> Column {
    Column::integer("message_id")
        .not_null()
        .references("messages", "message_id")
        .indexed()
}
