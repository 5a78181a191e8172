use std::collections::HashSet;

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait, QuerySelect, Set};

use crate::entities::validated_player_entity as players;
use crate::error::{AppError, AppResult};
use crate::models::PostbackParams;

/// 注册回调验证过的玩家
#[derive(Clone)]
pub struct ValidationService {
    pool: DatabaseConnection,
}

impl ValidationService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 按 player_id upsert，返回 player_id
    pub async fn upsert_player(&self, params: PostbackParams) -> AppResult<String> {
        let player_id = params
            .player_id
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::MissingField("player_id".to_string()))?
            .to_string();

        let clean = |v: Option<String>| {
            v.map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        let now = Utc::now();
        let row = players::ActiveModel {
            player_id: Set(player_id.clone()),
            currency: Set(clean(params.currency)),
            registration_date: Set(clean(params.registration_date)),
            player_type: Set(clean(params.player_type)),
            created_at: Set(now),
            updated_at: Set(now),
        };

        players::Entity::insert(row)
            .on_conflict(
                OnConflict::column(players::Column::PlayerId)
                    .update_columns([
                        players::Column::Currency,
                        players::Column::RegistrationDate,
                        players::Column::PlayerType,
                        players::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.pool)
            .await?;

        log::info!("Postback validated player {player_id}");
        Ok(player_id)
    }

    /// 抽奖时拉取的已验证 ID 集合
    pub async fn validated_ids(&self) -> AppResult<HashSet<String>> {
        let ids: Vec<String> = players::Entity::find()
            .select_only()
            .column(players::Column::PlayerId)
            .into_tuple()
            .all(&self.pool)
            .await?;
        Ok(ids.into_iter().map(|id| id.trim().to_string()).collect())
    }

    pub async fn count(&self) -> AppResult<u64> {
        Ok(players::Entity::find().count(&self.pool).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_db::setup_test_db;

    fn params(id: Option<&str>, currency: Option<&str>) -> PostbackParams {
        PostbackParams {
            player_id: id.map(String::from),
            currency: currency.map(String::from),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_upsert_by_player_id() {
        let svc = ValidationService::new(setup_test_db().await);
        assert_eq!(svc.upsert_player(params(Some(" P1 "), Some("BRL"))).await.unwrap(), "P1");
        svc.upsert_player(params(Some("P1"), Some("USD"))).await.unwrap();
        svc.upsert_player(params(Some("P2"), None)).await.unwrap();

        assert_eq!(svc.count().await.unwrap(), 2);
        let ids = svc.validated_ids().await.unwrap();
        assert!(ids.contains("P1") && ids.contains("P2"));

        let p1 = players::Entity::find_by_id("P1".to_string())
            .one(&svc.pool)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(p1.currency.as_deref(), Some("USD"));
    }

    #[tokio::test]
    async fn test_missing_player_id() {
        let svc = ValidationService::new(setup_test_db().await);
        assert!(matches!(
            svc.upsert_player(params(None, Some("BRL"))).await,
            Err(AppError::MissingField(_))
        ));
        assert!(svc.upsert_player(params(Some("  "), None)).await.is_err());
        assert_eq!(svc.count().await.unwrap(), 0);
    }
}
