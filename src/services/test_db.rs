use std::sync::Mutex;

use futures_util::future::BoxFuture;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbBackend, Schema};

use crate::entities::{
    banned_entry_entity, page_config_entity, raffle_win_entity, submission_entity,
    validated_player_entity,
};
use crate::error::{AppError, AppResult};
use crate::external::EmailSender;

/// 内存 SQLite，表结构直接由实体生成
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    let schema = Schema::new(DbBackend::Sqlite);

    let stmt = schema.create_table_from_entity(submission_entity::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    let stmt = schema.create_table_from_entity(raffle_win_entity::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    let stmt = schema.create_table_from_entity(page_config_entity::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    let stmt = schema.create_table_from_entity(banned_entry_entity::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    let stmt = schema.create_table_from_entity(validated_player_entity::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    db
}

/// 记录发送内容；收件人包含 "fail" 时返回错误
#[derive(Default)]
pub struct RecordingSender {
    pub sent: Mutex<Vec<String>>,
}

impl EmailSender for RecordingSender {
    fn send<'a>(
        &'a self,
        to: &'a str,
        _subject: &'a str,
        _body: &'a str,
        _from_name: &'a str,
    ) -> BoxFuture<'a, AppResult<String>> {
        Box::pin(async move {
            if to.contains("fail") {
                return Err(AppError::ExternalApiError("rejected".into()));
            }
            self.sent.lock().unwrap().push(to.to_string());
            Ok(format!("msg-{to}"))
        })
    }
}

