use super::withdrawal_service::{AmountRow, StatusRow};
use crate::entities::{TransactionStatus, deposit_entity as deposits};
use crate::error::{AppError, AppResult};
use crate::models::*;
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

#[derive(Clone)]
pub struct DepositService {
    pool: DatabaseConnection,
}

impl DepositService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    fn filter_condition(filter: &DepositFilter) -> Condition {
        let mut cond = Condition::all();
        if let Some(user_id) = &filter.user_id {
            cond = cond.add(deposits::Column::UserId.eq(user_id.as_str()));
        }
        if let Some(status) = filter.status {
            cond = cond.add(deposits::Column::Status.eq(status));
        }
        cond.add(filter.created.condition(deposits::Column::CreatedAt))
    }

    /// 创建充值记录，默认状态为 pending
    pub async fn create(&self, input: CreateDepositInput) -> AppResult<deposits::Model> {
        validate_amount("amount", input.amount)?;
        validate_finite("balanceBefore", input.balance_before)?;

        let now = Utc::now();
        let deposit = deposits::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            user_id: Set(input.user_id),
            amount: Set(input.amount),
            balance_before: Set(input.balance_before),
            status: Set(input.status.unwrap_or(TransactionStatus::Pending)),
            remarks: Set(input.remarks),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.pool)
        .await
        .map_err(|e| AppError::from_write(e, "Deposit"))?;

        log::info!(
            "Deposit created: id={} user_id={} amount={}",
            deposit.id,
            deposit.user_id,
            deposit.amount
        );
        Ok(deposit)
    }

    pub async fn find_unique(&self, id: &str) -> AppResult<Option<deposits::Model>> {
        let deposit = deposits::Entity::find_by_id(id.to_string())
            .one(&self.pool)
            .await?;
        Ok(deposit)
    }

    pub async fn get(&self, id: &str) -> AppResult<deposits::Model> {
        self.find_unique(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Deposit not found: {id}")))
    }

    pub async fn find_first(&self, filter: &DepositFilter) -> AppResult<Option<deposits::Model>> {
        let deposit = deposits::Entity::find()
            .filter(Self::filter_condition(filter))
            .order_by(deposits::Column::CreatedAt, filter.order.into())
            .order_by_asc(deposits::Column::Id)
            .one(&self.pool)
            .await?;
        Ok(deposit)
    }

    pub async fn find_many(
        &self,
        filter: &DepositFilter,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<deposits::Model>> {
        let paginator = deposits::Entity::find()
            .filter(Self::filter_condition(filter))
            .order_by(deposits::Column::CreatedAt, filter.order.into())
            .order_by_asc(deposits::Column::Id)
            .paginate(&self.pool, params.get_page_size());
        let total = paginator.num_items().await?;
        let data = paginator.fetch_page(params.get_page() - 1).await?;
        Ok(PaginatedResponse::new(data, params, total))
    }

    pub async fn count(&self, filter: &DepositFilter) -> AppResult<u64> {
        let n = deposits::Entity::find()
            .filter(Self::filter_condition(filter))
            .count(&self.pool)
            .await?;
        Ok(n)
    }

    pub async fn update(&self, id: &str, input: UpdateTransactionInput) -> AppResult<deposits::Model> {
        if input.is_empty() {
            return Err(AppError::ValidationError("No fields to update".to_string()));
        }

        let mut model = self.get(id).await?.into_active_model();
        if let Some(status) = input.status {
            model.status = Set(status);
        }
        if let Some(remarks) = input.remarks {
            model.remarks = Set(remarks);
        }
        model.updated_at = Set(Utc::now());

        let deposit = model.update(&self.pool).await?;
        Ok(deposit)
    }

    pub async fn update_status(
        &self,
        id: &str,
        status: TransactionStatus,
    ) -> AppResult<deposits::Model> {
        let deposit = self
            .update(id, UpdateTransactionInput::status(status))
            .await?;
        log::info!("Deposit {} status -> {}", deposit.id, status);
        Ok(deposit)
    }

    pub async fn update_many_status(
        &self,
        filter: &DepositFilter,
        status: TransactionStatus,
    ) -> AppResult<u64> {
        let res = deposits::Entity::update_many()
            .col_expr(
                deposits::Column::Status,
                deposits::Column::Status.save_as(Expr::val(status)),
            )
            .col_expr(deposits::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(Self::filter_condition(filter))
            .exec(&self.pool)
            .await?;
        log::info!(
            "Deposits bulk status -> {}: {} rows",
            status,
            res.rows_affected
        );
        Ok(res.rows_affected)
    }

    pub async fn delete(&self, id: &str) -> AppResult<deposits::Model> {
        let deposit = self.get(id).await?;
        deposits::Entity::delete_by_id(deposit.id.clone())
            .exec(&self.pool)
            .await?;
        Ok(deposit)
    }

    pub async fn aggregate(&self, filter: &DepositFilter) -> AppResult<AmountAggregate> {
        let amount = || Expr::col(deposits::Column::Amount);
        let row = deposits::Entity::find()
            .filter(Self::filter_condition(filter))
            .select_only()
            .column_as(Expr::col(deposits::Column::Id).count(), "count")
            .column_as(amount().sum(), "sum")
            .column_as(SimpleExpr::from(Func::avg(amount())), "avg")
            .column_as(amount().min(), "min")
            .column_as(amount().max(), "max")
            .into_model::<AmountRow>()
            .one(&self.pool)
            .await?;
        Ok(row.map(Into::into).unwrap_or_default())
    }

    pub async fn group_by_status(&self, filter: &DepositFilter) -> AppResult<Vec<StatusGroup>> {
        let rows = deposits::Entity::find()
            .filter(Self::filter_condition(filter))
            .select_only()
            .column(deposits::Column::Status)
            .column_as(Expr::col(deposits::Column::Id).count(), "count")
            .column_as(Expr::col(deposits::Column::Amount).sum(), "sum")
            .group_by(deposits::Column::Status)
            .order_by_asc(deposits::Column::Status)
            .into_model::<StatusRow>()
            .all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{seed_user, setup};
    use chrono::Duration;

    fn deposit(user_id: &str, amount: f64) -> CreateDepositInput {
        CreateDepositInput {
            user_id: user_id.to_string(),
            amount,
            balance_before: 0.0,
            status: None,
            remarks: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_read_back() {
        let pool = setup().await;
        let user = seed_user(&pool, "d@example.com", "+10000000001").await;
        let svc = DepositService::new(pool.clone());

        let mut input = deposit(&user.id, 250.0);
        input.status = Some(TransactionStatus::Proceed);
        let created = svc.create(input).await.unwrap();
        assert_eq!(created.status, TransactionStatus::Proceed);
        assert_eq!(svc.get(&created.id).await.unwrap(), created);

        assert!(matches!(
            svc.create(deposit(&user.id, -1.0)).await,
            Err(AppError::ValidationError(_))
        ));
        let mut bad_snapshot = deposit(&user.id, 1.0);
        bad_snapshot.balance_before = f64::NAN;
        assert!(matches!(
            svc.create(bad_snapshot).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_filters() {
        let pool = setup().await;
        let a = seed_user(&pool, "a@example.com", "+10000000001").await;
        let b = seed_user(&pool, "b@example.com", "+10000000002").await;
        let svc = DepositService::new(pool.clone());

        let first = svc.create(deposit(&a.id, 10.0)).await.unwrap();
        svc.create(deposit(&a.id, 15.0)).await.unwrap();
        svc.create(deposit(&b.id, 40.0)).await.unwrap();

        let of_a = DepositFilter {
            user_id: Some(a.id.clone()),
            ..Default::default()
        };
        assert_eq!(svc.count(&of_a).await.unwrap(), 2);

        let window = DepositFilter {
            created: DateRange::new(
                Some(first.created_at - Duration::minutes(1)),
                Some(first.created_at + Duration::minutes(1)),
            ),
            ..Default::default()
        };
        assert_eq!(svc.count(&window).await.unwrap(), 3);

        let future = DepositFilter {
            created: DateRange::new(Some(first.created_at + Duration::hours(1)), None),
            ..Default::default()
        };
        assert_eq!(svc.count(&future).await.unwrap(), 0);
        assert!(svc.find_first(&future).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_status_and_aggregates() {
        let pool = setup().await;
        let user = seed_user(&pool, "d@example.com", "+10000000001").await;
        let svc = DepositService::new(pool.clone());
        let a = svc.create(deposit(&user.id, 10.0)).await.unwrap();
        svc.create(deposit(&user.id, 30.0)).await.unwrap();

        svc.update_status(&a.id, TransactionStatus::Failed)
            .await
            .unwrap();
        let moved = svc
            .update_many_status(
                &DepositFilter {
                    status: Some(TransactionStatus::Pending),
                    ..Default::default()
                },
                TransactionStatus::Proceed,
            )
            .await
            .unwrap();
        assert_eq!(moved, 1);

        let proceeded = svc
            .aggregate(&DepositFilter {
                status: Some(TransactionStatus::Proceed),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(proceeded.count, 1);
        assert_eq!(proceeded.sum, 30.0);

        let groups = svc.group_by_status(&DepositFilter::default()).await.unwrap();
        assert_eq!(groups.len(), 2);
        assert!(groups.iter().all(|g| g.count == 1));

        svc.delete(&a.id).await.unwrap();
        assert!(matches!(svc.delete(&a.id).await, Err(AppError::NotFound(_))));
    }
}
