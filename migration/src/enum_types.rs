use sea_orm_migration::prelude::extension::postgres::Type;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DbBackend;

/// Postgres gets a native ENUM type; other backends store the value string in
/// a plain text column.
pub fn enum_column<T: IntoIden>(manager: &SchemaManager, col: T, type_name: &str) -> ColumnDef {
    let mut def = ColumnDef::new(col);
    match manager.get_database_backend() {
        DbBackend::Postgres => def.custom(Alias::new(type_name)),
        _ => def.string_len(32),
    };
    def
}

pub async fn create_enum(
    manager: &SchemaManager<'_>,
    type_name: &str,
    values: &[&str],
) -> Result<(), DbErr> {
    if manager.get_database_backend() != DbBackend::Postgres {
        return Ok(());
    }
    manager
        .create_type(
            Type::create()
                .as_enum(Alias::new(type_name))
                .values(values.iter().map(|v| Alias::new(*v)))
                .to_owned(),
        )
        .await
}

pub async fn drop_enum(manager: &SchemaManager<'_>, type_name: &str) -> Result<(), DbErr> {
    if manager.get_database_backend() != DbBackend::Postgres {
        return Ok(());
    }
    manager
        .drop_type(
            Type::drop()
                .if_exists()
                .name(Alias::new(type_name))
                .to_owned(),
        )
        .await
}
