use crate::database::begin;
use crate::entities::{PlanType, balance_entity as balances};
use crate::error::{AppError, AppResult};
use crate::models::*;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, IsolationLevel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

#[derive(Debug, FromQueryResult)]
struct TotalsRow {
    count: i64,
    balance: Option<f64>,
    pending_balance: Option<f64>,
    reward_balance: Option<f64>,
}

#[derive(Debug, FromQueryResult)]
struct PlanTotalsRow {
    plan: PlanType,
    count: i64,
    balance: Option<f64>,
    pending_balance: Option<f64>,
    reward_balance: Option<f64>,
}

impl From<TotalsRow> for BalanceTotals {
    fn from(r: TotalsRow) -> Self {
        Self {
            count: r.count,
            balance: r.balance.unwrap_or(0.0),
            pending_balance: r.pending_balance.unwrap_or(0.0),
            reward_balance: r.reward_balance.unwrap_or(0.0),
        }
    }
}

#[derive(Clone)]
pub struct BalanceService {
    pool: DatabaseConnection,
    isolation: Option<IsolationLevel>,
}

impl BalanceService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self {
            pool,
            isolation: None,
        }
    }

    /// Isolation level of the transactions this service opens.
    pub fn with_isolation(mut self, isolation: Option<IsolationLevel>) -> Self {
        self.isolation = isolation;
        self
    }

    fn unique_condition(key: &BalanceUnique) -> Condition {
        match key {
            BalanceUnique::Id(id) => Condition::all().add(balances::Column::Id.eq(id.as_str())),
            BalanceUnique::UserPlan { user_id, plan } => Condition::all()
                .add(balances::Column::UserId.eq(user_id.as_str()))
                .add(balances::Column::Plan.eq(*plan)),
        }
    }

    fn filter_condition(filter: &BalanceFilter) -> Condition {
        let mut cond = Condition::all();
        if let Some(user_id) = &filter.user_id {
            cond = cond.add(balances::Column::UserId.eq(user_id.as_str()));
        }
        if let Some(plan) = filter.plan {
            cond = cond.add(balances::Column::Plan.eq(plan));
        }
        if let Some(min) = filter.min_balance {
            cond = cond.add(balances::Column::Balance.gte(min));
        }
        cond
    }

    fn validate_create(input: &CreateBalanceInput) -> AppResult<()> {
        validate_finite("balance", input.balance)?;
        validate_finite("pendingBalance", input.pending_balance)?;
        validate_finite("rewardBalance", input.reward_balance)?;
        Ok(())
    }

    fn validate_update(input: &UpdateBalanceInput) -> AppResult<()> {
        if input.is_empty() {
            return Err(AppError::ValidationError("No fields to update".to_string()));
        }
        if let Some(u) = &input.balance {
            u.validate("balance")?;
        }
        if let Some(u) = &input.pending_balance {
            u.validate("pendingBalance")?;
        }
        if let Some(u) = &input.reward_balance {
            u.validate("rewardBalance")?;
        }
        Ok(())
    }

    async fn insert<C: ConnectionTrait>(
        db: &C,
        input: CreateBalanceInput,
    ) -> AppResult<balances::Model> {
        let now = Utc::now();
        balances::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            user_id: Set(input.user_id),
            plan: Set(input.plan),
            balance: Set(input.balance),
            pending_balance: Set(input.pending_balance),
            reward_balance: Set(input.reward_balance),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
        .map_err(|e| AppError::from_write(e, "Balance"))
    }

    /// Applies the numeric updates in SQL so concurrent writers never lose an
    /// increment, then reads the row back.
    async fn apply_update<C: ConnectionTrait>(
        db: &C,
        id: &str,
        input: &UpdateBalanceInput,
    ) -> AppResult<balances::Model> {
        let mut query = balances::Entity::update_many()
            .col_expr(balances::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(balances::Column::Id.eq(id));
        if let Some(u) = &input.balance {
            query = query.col_expr(balances::Column::Balance, u.expr(balances::Column::Balance));
        }
        if let Some(u) = &input.pending_balance {
            query = query.col_expr(
                balances::Column::PendingBalance,
                u.expr(balances::Column::PendingBalance),
            );
        }
        if let Some(u) = &input.reward_balance {
            query = query.col_expr(
                balances::Column::RewardBalance,
                u.expr(balances::Column::RewardBalance),
            );
        }
        query.exec(db).await?;

        balances::Entity::find_by_id(id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Balance not found: {id}")))
    }

    /// 创建余额记录；同一用户同一计划只能有一条
    pub async fn create(&self, input: CreateBalanceInput) -> AppResult<balances::Model> {
        Self::validate_create(&input)?;
        let balance = Self::insert(&self.pool, input).await?;
        log::info!(
            "Balance created: user_id={} plan={}",
            balance.user_id,
            balance.plan
        );
        Ok(balance)
    }

    pub async fn find_unique(&self, key: &BalanceUnique) -> AppResult<Option<balances::Model>> {
        let balance = balances::Entity::find()
            .filter(Self::unique_condition(key))
            .one(&self.pool)
            .await?;
        Ok(balance)
    }

    pub async fn get(&self, key: &BalanceUnique) -> AppResult<balances::Model> {
        self.find_unique(key)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Balance not found: {key:?}")))
    }

    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<balances::Model>> {
        let list = balances::Entity::find()
            .filter(balances::Column::UserId.eq(user_id))
            .order_by_asc(balances::Column::Plan)
            .all(&self.pool)
            .await?;
        Ok(list)
    }

    pub async fn find_first(&self, filter: &BalanceFilter) -> AppResult<Option<balances::Model>> {
        let balance = balances::Entity::find()
            .filter(Self::filter_condition(filter))
            .order_by_asc(balances::Column::CreatedAt)
            .one(&self.pool)
            .await?;
        Ok(balance)
    }

    pub async fn find_many(
        &self,
        filter: &BalanceFilter,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<balances::Model>> {
        let paginator = balances::Entity::find()
            .filter(Self::filter_condition(filter))
            .order_by_asc(balances::Column::CreatedAt)
            .order_by_asc(balances::Column::Id)
            .paginate(&self.pool, params.get_page_size());
        let total = paginator.num_items().await?;
        let data = paginator.fetch_page(params.get_page() - 1).await?;
        Ok(PaginatedResponse::new(data, params, total))
    }

    pub async fn count(&self, filter: &BalanceFilter) -> AppResult<u64> {
        let n = balances::Entity::find()
            .filter(Self::filter_condition(filter))
            .count(&self.pool)
            .await?;
        Ok(n)
    }

    pub async fn update(
        &self,
        key: &BalanceUnique,
        input: UpdateBalanceInput,
    ) -> AppResult<balances::Model> {
        Self::validate_update(&input)?;

        let txn = begin(&self.pool, self.isolation).await?;
        let current = balances::Entity::find()
            .filter(Self::unique_condition(key))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Balance not found: {key:?}")))?;
        let updated = Self::apply_update(&txn, &current.id, &input).await?;
        txn.commit().await?;
        Ok(updated)
    }

    /// Creates the (userId, plan) row from `create`, or applies `update` to the
    /// existing one. An empty `update` returns the existing row untouched.
    pub async fn upsert(
        &self,
        create: CreateBalanceInput,
        update: UpdateBalanceInput,
    ) -> AppResult<balances::Model> {
        Self::validate_create(&create)?;
        if !update.is_empty() {
            Self::validate_update(&update)?;
        }

        let txn = begin(&self.pool, self.isolation).await?;
        let existing = balances::Entity::find()
            .filter(Self::unique_condition(&BalanceUnique::UserPlan {
                user_id: create.user_id.clone(),
                plan: create.plan,
            }))
            .one(&txn)
            .await?;
        let balance = match existing {
            Some(current) if update.is_empty() => current,
            Some(current) => Self::apply_update(&txn, &current.id, &update).await?,
            None => Self::insert(&txn, create).await?,
        };
        txn.commit().await?;
        Ok(balance)
    }

    pub async fn delete(&self, key: &BalanceUnique) -> AppResult<balances::Model> {
        let balance = self.get(key).await?;
        balances::Entity::delete_by_id(balance.id.clone())
            .exec(&self.pool)
            .await?;
        Ok(balance)
    }

    pub async fn aggregate(&self, filter: &BalanceFilter) -> AppResult<BalanceTotals> {
        let row = balances::Entity::find()
            .filter(Self::filter_condition(filter))
            .select_only()
            .column_as(Expr::col(balances::Column::Id).count(), "count")
            .column_as(Expr::col(balances::Column::Balance).sum(), "balance")
            .column_as(
                Expr::col(balances::Column::PendingBalance).sum(),
                "pending_balance",
            )
            .column_as(
                Expr::col(balances::Column::RewardBalance).sum(),
                "reward_balance",
            )
            .into_model::<TotalsRow>()
            .one(&self.pool)
            .await?;
        Ok(row.map(Into::into).unwrap_or_default())
    }

    pub async fn group_by_plan(&self, filter: &BalanceFilter) -> AppResult<Vec<PlanBalanceTotals>> {
        let rows = balances::Entity::find()
            .filter(Self::filter_condition(filter))
            .select_only()
            .column(balances::Column::Plan)
            .column_as(Expr::col(balances::Column::Id).count(), "count")
            .column_as(Expr::col(balances::Column::Balance).sum(), "balance")
            .column_as(
                Expr::col(balances::Column::PendingBalance).sum(),
                "pending_balance",
            )
            .column_as(
                Expr::col(balances::Column::RewardBalance).sum(),
                "reward_balance",
            )
            .group_by(balances::Column::Plan)
            .order_by_asc(balances::Column::Plan)
            .into_model::<PlanTotalsRow>()
            .all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| PlanBalanceTotals {
                plan: r.plan,
                totals: BalanceTotals {
                    count: r.count,
                    balance: r.balance.unwrap_or(0.0),
                    pending_balance: r.pending_balance.unwrap_or(0.0),
                    reward_balance: r.reward_balance.unwrap_or(0.0),
                },
            })
            .collect())
    }
}
