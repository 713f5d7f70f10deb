//! Per-form table provisioning

use crate::contract::{
    is_system_column, Field, FormId, IP_ADDRESS, IS_FINALIZED, LAST_MODIFIED_DATE,
    SUBMISSION_DATE, SUBMISSION_ID,
};
use anyhow::Result;
use sea_orm::sea_query::{Alias, ColumnDef, Table, TableCreateStatement};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend};
use tracing::info;

use super::statements::table;

/// Create `form_{id}` with the system columns and one text column per custom
/// field. Existing tables are left untouched.
pub async fn provision_form_table(
    db: &DatabaseConnection,
    form_id: FormId,
    fields: &[Field],
) -> Result<()> {
    let backend = db.get_database_backend();
    let stmt = create_form_table(backend, form_id, fields);
    db.execute(backend.build(&stmt)).await?;
    info!(form_id, columns = fields.len(), "Provisioned form table");
    Ok(())
}

fn create_form_table(backend: DbBackend, form_id: FormId, fields: &[Field]) -> TableCreateStatement {
    let mut id = ColumnDef::new(Alias::new(SUBMISSION_ID));
    // SQLite only auto-increments an INTEGER PRIMARY KEY
    if backend == DbBackend::Sqlite {
        id.integer();
    } else {
        id.big_integer();
    }
    id.not_null().auto_increment().primary_key();

    let mut stmt = Table::create();
    stmt.table(table(form_id))
        .if_not_exists()
        .col(&mut id)
        .col(ColumnDef::new(Alias::new(SUBMISSION_DATE)).date_time().not_null())
        .col(ColumnDef::new(Alias::new(LAST_MODIFIED_DATE)).date_time().not_null())
        .col(ColumnDef::new(Alias::new(IP_ADDRESS)).string_len(45))
        .col(
            ColumnDef::new(Alias::new(IS_FINALIZED))
                .string_len(3)
                .not_null()
                .default("yes"),
        );

    for field in fields.iter().filter(|f| !is_system_column(&f.column_name)) {
        stmt.col(ColumnDef::new(Alias::new(field.column_name.as_str())).text());
    }
    stmt
}
