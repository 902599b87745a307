use crate::database::begin;
use crate::entities::{PlanType, reward_rate_setting_entity as rates};
use crate::error::{AppError, AppResult};
use crate::models::*;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, IsolationLevel, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

#[derive(Clone)]
pub struct RewardRateService {
    pool: DatabaseConnection,
    isolation: Option<IsolationLevel>,
}

impl RewardRateService {
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

    fn unique_condition(key: &RewardRateUnique) -> Condition {
        match key {
            RewardRateUnique::Id(id) => Condition::all().add(rates::Column::Id.eq(id.as_str())),
            RewardRateUnique::Plan(plan) => Condition::all().add(rates::Column::Plan.eq(*plan)),
        }
    }

    fn validate_rate(rate: f64) -> AppResult<()> {
        if !rate.is_finite() || rate < 0.0 {
            return Err(AppError::ValidationError(
                "rate must be a non-negative number".to_string(),
            ));
        }
        Ok(())
    }

    async fn insert<C: ConnectionTrait>(
        db: &C,
        plan: PlanType,
        rate: f64,
    ) -> AppResult<rates::Model> {
        rates::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            plan: Set(plan),
            rate: Set(rate),
            updated_at: Set(Utc::now()),
        }
        .insert(db)
        .await
        .map_err(|e| AppError::from_write(e, "RewardRateSetting"))
    }

    /// 新建计划利率；同一计划只能配置一次
    pub async fn create(&self, plan: PlanType, rate: f64) -> AppResult<rates::Model> {
        Self::validate_rate(rate)?;
        let setting = Self::insert(&self.pool, plan, rate).await?;
        log::info!("Reward rate created: plan={} rate={}", plan, rate);
        Ok(setting)
    }

    pub async fn find_unique(&self, key: &RewardRateUnique) -> AppResult<Option<rates::Model>> {
        let setting = rates::Entity::find()
            .filter(Self::unique_condition(key))
            .one(&self.pool)
            .await?;
        Ok(setting)
    }

    pub async fn get(&self, key: &RewardRateUnique) -> AppResult<rates::Model> {
        self.find_unique(key)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reward rate not found: {key:?}")))
    }

    /// Configured rate of `plan`, `None` when the plan has no setting yet.
    pub async fn rate_for(&self, plan: PlanType) -> AppResult<Option<f64>> {
        let setting = self.find_unique(&RewardRateUnique::Plan(plan)).await?;
        Ok(setting.map(|s| s.rate))
    }

    pub async fn find_all(&self) -> AppResult<Vec<rates::Model>> {
        let list = rates::Entity::find()
            .order_by_asc(rates::Column::Plan)
            .all(&self.pool)
            .await?;
        Ok(list)
    }

    pub async fn find_many(
        &self,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<rates::Model>> {
        let paginator = rates::Entity::find()
            .order_by_asc(rates::Column::Plan)
            .paginate(&self.pool, params.get_page_size());
        let total = paginator.num_items().await?;
        let data = paginator.fetch_page(params.get_page() - 1).await?;
        Ok(PaginatedResponse::new(data, params, total))
    }

    pub async fn count(&self) -> AppResult<u64> {
        let n = rates::Entity::find().count(&self.pool).await?;
        Ok(n)
    }

    pub async fn update(&self, key: &RewardRateUnique, rate: f64) -> AppResult<rates::Model> {
        Self::validate_rate(rate)?;
        let mut model = self.get(key).await?.into_active_model();
        model.rate = Set(rate);
        model.updated_at = Set(Utc::now());
        let setting = model.update(&self.pool).await?;
        log::info!("Reward rate updated: plan={} rate={}", setting.plan, rate);
        Ok(setting)
    }

    /// Sets the rate of `plan`, creating the setting when it does not exist.
    pub async fn upsert_rate(&self, plan: PlanType, rate: f64) -> AppResult<rates::Model> {
        Self::validate_rate(rate)?;

        let txn = begin(&self.pool, self.isolation).await?;
        let existing = rates::Entity::find()
            .filter(rates::Column::Plan.eq(plan))
            .one(&txn)
            .await?;
        let setting = match existing {
            Some(current) => {
                let mut model = current.into_active_model();
                model.rate = Set(rate);
                model.updated_at = Set(Utc::now());
                model.update(&txn).await?
            }
            None => Self::insert(&txn, plan, rate).await?,
        };
        txn.commit().await?;

        log::info!("Reward rate set: plan={} rate={}", plan, rate);
        Ok(setting)
    }

    pub async fn delete(&self, key: &RewardRateUnique) -> AppResult<rates::Model> {
        let setting = self.get(key).await?;
        rates::Entity::delete_by_id(setting.id.clone())
            .exec(&self.pool)
            .await?;
        Ok(setting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::setup;

    #[tokio::test]
    async fn test_create_and_read_back() {
        let pool = setup().await;
        let svc = RewardRateService::new(pool.clone());

        let created = svc.create(PlanType::Seed, 0.045).await.unwrap();
        assert_eq!(created.rate, 0.045);
        assert_eq!(
            svc.get(&RewardRateUnique::Plan(PlanType::Seed)).await.unwrap(),
            created
        );
        assert_eq!(svc.rate_for(PlanType::Seed).await.unwrap(), Some(0.045));
        assert_eq!(svc.rate_for(PlanType::Tree).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_duplicate_plan_is_rejected() {
        let pool = setup().await;
        let svc = RewardRateService::new(pool.clone());
        svc.create(PlanType::Plant, 0.01).await.unwrap();
        assert!(matches!(
            svc.create(PlanType::Plant, 0.02).await,
            Err(AppError::Conflict(_))
        ));
        assert_eq!(svc.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_rejects_negative_rate() {
        let pool = setup().await;
        let svc = RewardRateService::new(pool.clone());
        assert!(matches!(
            svc.create(PlanType::Plant, -0.5).await,
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            svc.upsert_rate(PlanType::Plant, f64::NAN).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_upsert_rate() {
        let pool = setup().await;
        let svc = RewardRateService::new(pool.clone());

        let first = svc.upsert_rate(PlanType::Tree, 0.05).await.unwrap();
        let second = svc.upsert_rate(PlanType::Tree, 0.07).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.rate, 0.07);
        svc.upsert_rate(PlanType::Plant, 0.01).await.unwrap();

        let all = svc.find_all().await.unwrap();
        assert_eq!(all.len(), 2);
        let page = svc
            .find_many(&PaginationParams::new(Some(2), Some(1)))
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.data.len(), 1);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let pool = setup().await;
        let svc = RewardRateService::new(pool.clone());
        let created = svc.create(PlanType::Seed, 0.03).await.unwrap();

        let updated = svc
            .update(&RewardRateUnique::Id(created.id.clone()), 0.04)
            .await
            .unwrap();
        assert_eq!(updated.rate, 0.04);
        assert!(updated.updated_at >= created.updated_at);

        svc.delete(&RewardRateUnique::Plan(PlanType::Seed))
            .await
            .unwrap();
        assert!(matches!(
            svc.update(&RewardRateUnique::Plan(PlanType::Seed), 0.1).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_upsert_under_configured_isolation() {
        let pool = setup().await;
        let svc = RewardRateService::new(pool.clone()).with_isolation(Some(IsolationLevel::Serializable));
        assert_eq!(svc.isolation, Some(IsolationLevel::Serializable));

        svc.upsert_rate(PlanType::Seed, 0.02).await.unwrap();
        assert_eq!(svc.rate_for(PlanType::Seed).await.unwrap(), Some(0.02));
    }
}
