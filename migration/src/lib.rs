pub use sea_orm_migration::prelude::*;

mod m20260301_000001_initial;
mod m20260308_000002_add_validated_players;
mod m20260315_000003_add_tip_assigned_at;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_initial::Migration),
            Box::new(m20260308_000002_add_validated_players::Migration),
            Box::new(m20260315_000003_add_tip_assigned_at::Migration),
        ]
    }
}
