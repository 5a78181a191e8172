use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::entities::{raffle_win_entity as wins_tbl, submission_entity as submissions};
use crate::error::{AppError, AppResult};
use crate::models::{
    DrawResponse, EligibilityEntry, PageConfig, PaginatedResponse, PaginationParams, Submission,
    TipBudgetResponse, WinListQuery, WinRecord, field_map_to_json,
};
use crate::services::eligibility::{
    self, WindowBounds, account_id, can_win, count_wins, passes_validation, pick_random,
};
use crate::services::feed::{EventFeed, FeedEvent, RaffleEvent};
use crate::services::{ConfigService, NotificationService, ValidationService};
use crate::utils::parse_tip_amount;

pub const NO_ELIGIBLE_MESSAGE: &str = "no eligible participants";

/// 一次抽奖所需的全部输入，加锁后读取
struct DrawContext {
    config: PageConfig,
    submissions: Vec<Submission>,
    wins: Vec<WinRecord>,
    validated: Option<HashSet<String>>,
}

/// 抽奖引擎
///
/// 所有写中奖记录的操作（抽奖、设置小费、清空）都持有 `draw_lock`，
/// 因此"检查资格 -> 写入"在单进程内是原子的。
#[derive(Clone)]
pub struct RaffleService {
    pool: DatabaseConnection,
    config_service: ConfigService,
    validation_service: ValidationService,
    notification_service: NotificationService,
    feed: EventFeed,
    draw_lock: Arc<Mutex<()>>,
}

impl RaffleService {
    pub fn new(
        pool: DatabaseConnection,
        config_service: ConfigService,
        validation_service: ValidationService,
        notification_service: NotificationService,
        feed: EventFeed,
    ) -> Self {
        Self {
            pool,
            config_service,
            validation_service,
            notification_service,
            feed,
            draw_lock: Arc::new(Mutex::new(())),
        }
    }

    /// 随机抽取 `count` 人
    pub async fn draw_random(&self, count: usize) -> AppResult<DrawResponse> {
        let mut rng = StdRng::from_entropy();
        self.draw_random_with(count, &mut rng).await
    }

    pub async fn draw_random_with<R: Rng + Send>(
        &self,
        count: usize,
        rng: &mut R,
    ) -> AppResult<DrawResponse> {
        let _guard = self.draw_lock.lock().await;
        let ctx = self.load_context().await?;
        let now = Local::now();

        let eligible = eligibility::eligible_submissions(
            ctx.submissions,
            &ctx.wins,
            &ctx.config,
            ctx.validated.as_ref(),
            &now,
        );
        let pool_size = eligible.len();
        let winners = pick_random(eligible, count, rng);
        log::info!(
            "Random draw: requested {count}, eligible {pool_size}, drawn {}",
            winners.len()
        );

        self.record(count, winners, &ctx.config).await
    }

    /// 按给定顺序逐个抽取；不存在或不满足条件的 ID 直接跳过
    ///
    /// 每个 ID 都会看到本批次前面已产生的中奖记录，
    /// 因此同一个 ID 重复出现时不会超出上限。
    pub async fn draw_selected(&self, submission_ids: &[String]) -> AppResult<DrawResponse> {
        let _guard = self.draw_lock.lock().await;
        let ctx = self.load_context().await?;
        let now = Local::now();

        let by_id: HashMap<&str, &Submission> =
            ctx.submissions.iter().map(|s| (s.id.as_str(), s)).collect();
        let mut wins = ctx.wins.clone();
        let mut winners = Vec::new();

        for id in submission_ids {
            let Some(submission) = by_id.get(id.as_str()) else {
                log::debug!("Manual draw skipped unknown submission {id}");
                continue;
            };
            if !can_win(&submission.data, &wins, &ctx.config, &now)
                || !passes_validation(&submission.data, &ctx.config, ctx.validated.as_ref())
            {
                log::debug!("Manual draw skipped ineligible submission {id}");
                continue;
            }
            wins.push(snapshot(submission, now.with_timezone(&Utc)));
            winners.push((*submission).clone());
        }

        self.record(submission_ids.len(), winners, &ctx.config).await
    }

    /// 给中奖记录设置小费，只能设置一次
    pub async fn assign_tip(&self, win_id: &str, tip_value: &str) -> AppResult<WinRecord> {
        let tip_value = tip_value.trim();
        if tip_value.is_empty() {
            return Err(AppError::ValidationError(
                "Tip value cannot be empty".to_string(),
            ));
        }

        let _guard = self.draw_lock.lock().await;
        let config = self.config_service.get().await;

        let win = wins_tbl::Entity::find_by_id(win_id.to_string())
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Win record not found".to_string()))?;

        if win.tip_value.is_some() {
            return Err(AppError::ValidationError(
                "Tip value already assigned".to_string(),
            ));
        }
        if !config.tip_values.is_empty() && !config.tip_values.iter().any(|v| v == tip_value) {
            return Err(AppError::ValidationError(format!(
                "Tip value is not configured: {tip_value}"
            )));
        }

        if let Some(budget) = config.weekly_tip_budget {
            let spent = self.spent_this_week().await?;
            let amount = parse_tip_amount(tip_value).unwrap_or(0.0);
            if spent + amount > budget + f64::EPSILON {
                log::warn!("Tip {tip_value} on win {win_id} exceeds weekly budget ({spent}/{budget})");
                return Err(AppError::ValidationError(format!(
                    "Weekly tip budget exceeded: remaining {:.2}",
                    (budget - spent).max(0.0)
                )));
            }
        }

        let mut am = win.into_active_model();
        am.tip_value = Set(Some(tip_value.to_string()));
        am.tip_assigned_at = Set(Some(Utc::now()));
        let model = am.update(&self.pool).await?;
        Ok(model.into())
    }

    pub async fn tip_budget(&self) -> AppResult<TipBudgetResponse> {
        let config = self.config_service.get().await;
        let spent = self.spent_this_week().await?;
        Ok(TipBudgetResponse {
            weekly_budget: config.weekly_tip_budget,
            spent_this_week: spent,
            remaining: config.weekly_tip_budget.map(|b| (b - spent).max(0.0)),
        })
    }

    /// 中奖记录分页（最新在前）
    pub async fn list_wins(&self, query: &WinListQuery) -> AppResult<PaginatedResponse<WinRecord>> {
        let params = PaginationParams::new(query.page, query.per_page);
        let base = wins_tbl::Entity::find();
        let total = base.clone().count(&self.pool).await?;
        let items = base
            .order_by_desc(wins_tbl::Column::WonAt)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?;
        Ok(PaginatedResponse::new(
            items.into_iter().map(Into::into).collect(),
            &params,
            total,
        ))
    }

    /// 全部中奖记录（按时间升序）
    pub async fn all_wins(&self) -> AppResult<Vec<WinRecord>> {
        let list = wins_tbl::Entity::find()
            .order_by_asc(wins_tbl::Column::WonAt)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    /// 某个本地日期内的中奖记录（按时间升序）
    pub async fn wins_by_date(&self, date: NaiveDate) -> AppResult<Vec<WinRecord>> {
        let (start, end) = eligibility::day_range(&Local, date);
        let list = wins_tbl::Entity::find()
            .filter(wins_tbl::Column::WonAt.gte(start))
            .filter(wins_tbl::Column::WonAt.lt(end))
            .order_by_asc(wins_tbl::Column::WonAt)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    /// 每条报名当前的中奖次数与可抽状态
    pub async fn eligibility_overview(&self) -> AppResult<Vec<EligibilityEntry>> {
        let ctx = self.load_context().await?;
        let now = Local::now();
        let empty = crate::models::WinCounts {
            day: 0,
            week: 0,
            month: 0,
        };

        Ok(ctx
            .submissions
            .into_iter()
            .map(|s| {
                let wins = account_id(&s.data, &ctx.config)
                    .map(|a| count_wins(a, &ctx.wins, &ctx.config, &now))
                    .unwrap_or(empty);
                let validated = passes_validation(&s.data, &ctx.config, ctx.validated.as_ref());
                let eligible = validated && can_win(&s.data, &ctx.wins, &ctx.config, &now);
                EligibilityEntry {
                    submission: s,
                    eligible,
                    validated,
                    wins,
                }
            })
            .collect())
    }

    /// 清空全部中奖记录（会重置所有人的中奖次数）
    pub async fn clear_wins(&self) -> AppResult<u64> {
        let _guard = self.draw_lock.lock().await;
        let res = wins_tbl::Entity::delete_many().exec(&self.pool).await?;
        log::warn!("Cleared {} win records", res.rows_affected);
        Ok(res.rows_affected)
    }

    async fn load_context(&self) -> AppResult<DrawContext> {
        let config = self.config_service.get().await;
        let submissions: Vec<Submission> = submissions::Entity::find()
            .order_by_asc(submissions::Column::CreatedAt)
            .all(&self.pool)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        let wins = self.all_wins().await?;
        let validated = if config.postback_validation_enabled {
            Some(self.validation_service.validated_ids().await?)
        } else {
            None
        };
        Ok(DrawContext {
            config,
            submissions,
            wins,
            validated,
        })
    }

    /// 在一个事务中写入中奖记录，提交后推送事件并发送通知
    async fn record(
        &self,
        requested: usize,
        winners: Vec<Submission>,
        config: &PageConfig,
    ) -> AppResult<DrawResponse> {
        if winners.is_empty() {
            return Ok(DrawResponse {
                requested,
                winners,
                wins: Vec::new(),
                message: Some(NO_ELIGIBLE_MESSAGE.to_string()),
            });
        }

        let won_at = Utc::now();
        let txn = self.pool.begin().await?;
        let mut wins = Vec::with_capacity(winners.len());
        for winner in &winners {
            let draft = snapshot(winner, won_at);
            let model = wins_tbl::ActiveModel {
                id: Set(draft.id),
                submission_id: Set(draft.submission_id),
                submission_data: Set(field_map_to_json(&draft.submission_data)),
                won_at: Set(draft.won_at),
                tip_value: Set(None),
                tip_assigned_at: Set(None),
            }
            .insert(&txn)
            .await?;
            wins.push(WinRecord::from(model));
        }
        txn.commit().await?;

        for win in &wins {
            self.feed
                .publish(FeedEvent::Raffle(RaffleEvent::WinRecorded(win.clone())));
        }
        self.notification_service.dispatch(&wins, config);

        Ok(DrawResponse {
            requested,
            winners,
            wins,
            message: None,
        })
    }

    /// 本周（周日零点起）设置的小费总额，按设置时间而非抽奖时间统计
    async fn spent_this_week(&self) -> AppResult<f64> {
        let week_start = WindowBounds::at(&Local::now(), false).week;
        let tips: Vec<Option<String>> = wins_tbl::Entity::find()
            .select_only()
            .column(wins_tbl::Column::TipValue)
            .filter(wins_tbl::Column::TipAssignedAt.gte(week_start))
            .filter(wins_tbl::Column::TipValue.is_not_null())
            .into_tuple()
            .all(&self.pool)
            .await?;
        Ok(tips
            .iter()
            .flatten()
            .filter_map(|t| parse_tip_amount(t))
            .sum())
    }
}

fn snapshot(submission: &Submission, won_at: DateTime<Utc>) -> WinRecord {
    WinRecord {
        id: Uuid::new_v4().to_string(),
        submission_id: submission.id.clone(),
        submission_data: submission.data.clone(),
        won_at,
        tip_value: None,
        tip_assigned_at: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateBanRequest, FieldMap, PostbackParams};
    use crate::services::test_db::RecordingSender;
    use crate::services::test_db::setup_test_db;
    use crate::services::{BanService, SubmissionService};
    use serde_json::json;

    struct Fixture {
        db: DatabaseConnection,
        raffle: RaffleService,
        submissions: SubmissionService,
        config: ConfigService,
        validation: ValidationService,
        bans: BanService,
    }

    async fn setup() -> Fixture {
        let db = setup_test_db().await;
        let feed = EventFeed::new(64);
        let config = ConfigService::load(db.clone()).await.unwrap();
        let bans = BanService::new(db.clone());
        let validation = ValidationService::new(db.clone());
        let notifications =
            NotificationService::new(Arc::new(RecordingSender::default()), feed.clone());
        let submissions =
            SubmissionService::new(db.clone(), config.clone(), bans.clone(), feed.clone());
        let raffle = RaffleService::new(
            db.clone(),
            config.clone(),
            validation.clone(),
            notifications,
            feed,
        );
        Fixture {
            db,
            raffle,
            submissions,
            config,
            validation,
            bans,
        }
    }

    fn form(name: &str, account: &str) -> FieldMap {
        let mut m = FieldMap::new();
        m.insert("fullName".into(), name.into());
        m.insert("email".into(), format!("{}@example.com", name.to_lowercase()));
        m.insert("accountId".into(), account.into());
        m
    }

    #[tokio::test]
    async fn test_draw_random_never_exceeds_eligible() {
        let f = setup().await;
        for (name, account) in [("Ana", "A1"), ("Bia", "B2"), ("Caio", "C3")] {
            f.submissions.submit(form(name, account), false, None).await.unwrap();
        }
        let mut rng = StdRng::seed_from_u64(1);
        let res = f.raffle.draw_random_with(10, &mut rng).await.unwrap();
        assert_eq!(res.winners.len(), 3);
        assert_eq!(res.wins.len(), 3);
        assert!(res.message.is_none());

        let ids: HashSet<_> = res.winners.iter().map(|s| s.id.clone()).collect();
        assert_eq!(ids.len(), 3);
        for (winner, win) in res.winners.iter().zip(&res.wins) {
            assert_eq!(winner.id, win.submission_id);
        }

        let res = f.raffle.draw_random_with(2, &mut rng).await.unwrap();
        assert_eq!(res.winners.len(), 2);
    }

    #[tokio::test]
    async fn test_draw_random_with_no_eligible_reports_message() {
        let f = setup().await;
        let res = f.raffle.draw_random(3).await.unwrap();
        assert!(res.winners.is_empty());
        assert_eq!(res.message.as_deref(), Some(NO_ELIGIBLE_MESSAGE));
    }

    #[tokio::test]
    async fn test_draw_selected_twice_same_day_respects_daily_cap() {
        let f = setup().await;
        f.config
            .update(json!({ "maxDailyWins": 1, "maxWeeklyWins": 5, "maxMonthlyWins": 20 }))
            .await
            .unwrap();
        let s = f.submissions.submit(form("Ana", "A1"), false, None).await.unwrap();

        let first = f.raffle.draw_selected(&[s.id.clone()]).await.unwrap();
        assert_eq!(first.wins.len(), 1);
        let second = f.raffle.draw_selected(&[s.id.clone()]).await.unwrap();
        assert!(second.wins.is_empty());
        assert_eq!(second.message.as_deref(), Some(NO_ELIGIBLE_MESSAGE));
    }

    #[tokio::test]
    async fn test_draw_selected_duplicate_id_in_one_batch() {
        let f = setup().await;
        f.config
            .update(json!({ "maxDailyWins": 2 }))
            .await
            .unwrap();
        let s = f.submissions.submit(form("Ana", "A1"), false, None).await.unwrap();
        f.raffle.draw_selected(&[s.id.clone()]).await.unwrap();

        // 只剩一次机会：同一批次重复的 ID 只能记录一次
        let res = f
            .raffle
            .draw_selected(&[s.id.clone(), s.id.clone(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(res.requested, 3);
        assert_eq!(res.wins.len(), 1);
        assert_eq!(f.raffle.all_wins().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_snapshot_survives_edit_and_delete() {
        let f = setup().await;
        let s = f.submissions.submit(form("Ana", "A1"), false, None).await.unwrap();
        let res = f.raffle.draw_selected(&[s.id.clone()]).await.unwrap();
        let original = res.wins[0].submission_data.clone();

        f.submissions.update(&s.id, form("Outra", "Z9")).await.unwrap();
        f.submissions.delete(&s.id).await.unwrap();
        f.submissions.clear().await.unwrap();

        let stored = f.raffle.all_wins().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].submission_data, original);
        assert_eq!(stored[0].submission_id, s.id);
    }

    #[tokio::test]
    async fn test_postback_validation_filters_draw() {
        let f = setup().await;
        f.config
            .update(json!({ "postbackValidationEnabled": true }))
            .await
            .unwrap();
        let a = f.submissions.submit(form("Ana", "A1"), false, None).await.unwrap();
        let b = f.submissions.submit(form("Bia", "B2"), false, None).await.unwrap();
        f.validation
            .upsert_player(PostbackParams {
                player_id: Some("B2".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        let res = f.raffle.draw_random(5).await.unwrap();
        assert_eq!(res.winners.len(), 1);
        assert_eq!(res.winners[0].id, b.id);

        let res = f.raffle.draw_selected(&[a.id.clone()]).await.unwrap();
        assert!(res.wins.is_empty());

        let overview = f.raffle.eligibility_overview().await.unwrap();
        let entry_a = overview.iter().find(|e| e.submission.id == a.id).unwrap();
        assert!(!entry_a.validated && !entry_a.eligible);
    }

    #[tokio::test]
    async fn test_assign_tip_rules() {
        let f = setup().await;
        f.config
            .update(json!({ "tipValues": ["R$ 10,00", "R$ 50,00"], "weeklyTipBudget": 55.0 }))
            .await
            .unwrap();
        let a = f.submissions.submit(form("Ana", "A1"), false, None).await.unwrap();
        let b = f.submissions.submit(form("Bia", "B2"), false, None).await.unwrap();
        let res = f
            .raffle
            .draw_selected(&[a.id.clone(), b.id.clone()])
            .await
            .unwrap();
        let (wa, wb) = (&res.wins[0].id, &res.wins[1].id);

        assert!(matches!(
            f.raffle.assign_tip(wa, "R$ 99").await,
            Err(AppError::ValidationError(_))
        ));
        let win = f.raffle.assign_tip(wa, "R$ 50,00").await.unwrap();
        assert_eq!(win.tip_value.as_deref(), Some("R$ 50,00"));
        assert!(f.raffle.assign_tip(wa, "R$ 10,00").await.is_err());

        // 50 + 10 > 55
        assert!(f.raffle.assign_tip(wb, "R$ 10,00").await.is_err());
        let budget = f.raffle.tip_budget().await.unwrap();
        assert_eq!(budget.spent_this_week, 50.0);
        assert_eq!(budget.remaining, Some(5.0));

        assert!(matches!(
            f.raffle.assign_tip("nope", "R$ 10,00").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_budget_counts_tips_by_assignment_time() {
        let f = setup().await;
        f.config
            .update(json!({ "tipValues": ["50"], "weeklyTipBudget": 55.0 }))
            .await
            .unwrap();

        // 上周抽中、本周才设置小费
        wins_tbl::ActiveModel {
            id: Set("old".to_string()),
            submission_id: Set("s-old".to_string()),
            submission_data: Set(field_map_to_json(&form("Ana", "A1"))),
            won_at: Set(Utc::now() - chrono::Duration::days(8)),
            tip_value: Set(None),
            tip_assigned_at: Set(None),
        }
        .insert(&f.db)
        .await
        .unwrap();
        let s = f.submissions.submit(form("Bia", "B2"), false, None).await.unwrap();
        let res = f.raffle.draw_selected(&[s.id.clone()]).await.unwrap();

        let old = f.raffle.assign_tip("old", "50").await.unwrap();
        assert!(old.tip_assigned_at.is_some());
        assert_eq!(f.raffle.tip_budget().await.unwrap().spent_this_week, 50.0);

        // 50 + 50 > 55
        assert!(matches!(
            f.raffle.assign_tip(&res.wins[0].id, "50").await,
            Err(AppError::ValidationError(_))
        ));
        assert_eq!(f.raffle.tip_budget().await.unwrap().remaining, Some(5.0));
    }

    #[tokio::test]
    async fn test_ban_does_not_remove_existing_wins() {
        let f = setup().await;
        let s = f.submissions.submit(form("Ana", "A1"), false, None).await.unwrap();
        f.raffle.draw_selected(&[s.id.clone()]).await.unwrap();
        f.bans
            .add(CreateBanRequest {
                ban_type: crate::entities::BanType::AccountId,
                value: "a1".into(),
                reason: String::new(),
            })
            .await
            .unwrap();
        assert_eq!(f.raffle.all_wins().await.unwrap().len(), 1);
        assert_eq!(f.raffle.clear_wins().await.unwrap(), 1);
        let page = f.raffle.list_wins(&WinListQuery { page: None, per_page: None }).await.unwrap();
        assert_eq!(page.total, 0);
    }
}
