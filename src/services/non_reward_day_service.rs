use crate::entities::non_reward_day_entity as days;
use crate::error::{AppError, AppResult};
use crate::models::*;
use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

#[derive(Clone)]
pub struct NonRewardDayService {
    pool: DatabaseConnection,
}

impl NonRewardDayService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    fn unique_condition(key: &NonRewardDayUnique) -> Condition {
        match key {
            NonRewardDayUnique::Id(id) => Condition::all().add(days::Column::Id.eq(id.as_str())),
            NonRewardDayUnique::Date(date) => Condition::all().add(days::Column::Date.eq(*date)),
        }
    }

    fn filter_condition(filter: &NonRewardDayFilter) -> Condition {
        let mut cond = Condition::all();
        if let Some(from) = filter.from {
            cond = cond.add(days::Column::Date.gte(from));
        }
        if let Some(to) = filter.to {
            cond = cond.add(days::Column::Date.lte(to));
        }
        if let Some(created_by) = &filter.created_by {
            cond = cond.add(days::Column::CreatedBy.eq(created_by.as_str()));
        }
        cond
    }

    fn active_model(input: CreateNonRewardDayInput) -> days::ActiveModel {
        days::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            date: Set(input.date),
            reason: Set(input.reason),
            created_by: Set(input.created_by),
            created_at: Set(Utc::now()),
        }
    }

    /// 登记不计奖励的日期；同一日期只能登记一次
    pub async fn create(&self, input: CreateNonRewardDayInput) -> AppResult<days::Model> {
        let day = Self::active_model(input)
            .insert(&self.pool)
            .await
            .map_err(|e| AppError::from_write(e, "NonRewardDay"))?;
        log::info!("Non-reward day added: {} by {}", day.date, day.created_by);
        Ok(day)
    }

    /// Inserts every day whose date is not registered yet and returns how many
    /// rows were written.
    pub async fn create_many(&self, inputs: Vec<CreateNonRewardDayInput>) -> AppResult<u64> {
        if inputs.is_empty() {
            return Ok(0);
        }
        let models = inputs
            .into_iter()
            .map(Self::active_model)
            .collect::<Vec<_>>();

        let inserted = days::Entity::insert_many(models)
            .on_conflict(
                OnConflict::column(days::Column::Date)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.pool)
            .await?;
        log::info!("Non-reward days added: {}", inserted);
        Ok(inserted)
    }

    pub async fn find_unique(&self, key: &NonRewardDayUnique) -> AppResult<Option<days::Model>> {
        let day = days::Entity::find()
            .filter(Self::unique_condition(key))
            .one(&self.pool)
            .await?;
        Ok(day)
    }

    pub async fn get(&self, key: &NonRewardDayUnique) -> AppResult<days::Model> {
        self.find_unique(key)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Non-reward day not found: {key:?}")))
    }

    pub async fn is_non_reward_day(&self, date: NaiveDate) -> AppResult<bool> {
        let n = days::Entity::find()
            .filter(days::Column::Date.eq(date))
            .count(&self.pool)
            .await?;
        Ok(n > 0)
    }

    /// Registered days in `[from, to]`, oldest first.
    pub async fn find_between(&self, from: NaiveDate, to: NaiveDate) -> AppResult<Vec<days::Model>> {
        if from > to {
            return Err(AppError::ValidationError(
                "from must not be after to".to_string(),
            ));
        }
        let list = days::Entity::find()
            .filter(Self::filter_condition(&NonRewardDayFilter {
                from: Some(from),
                to: Some(to),
                created_by: None,
            }))
            .order_by_asc(days::Column::Date)
            .all(&self.pool)
            .await?;
        Ok(list)
    }

    pub async fn find_first(&self, filter: &NonRewardDayFilter) -> AppResult<Option<days::Model>> {
        let day = days::Entity::find()
            .filter(Self::filter_condition(filter))
            .order_by_asc(days::Column::Date)
            .one(&self.pool)
            .await?;
        Ok(day)
    }

    pub async fn find_many(
        &self,
        filter: &NonRewardDayFilter,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<days::Model>> {
        let paginator = days::Entity::find()
            .filter(Self::filter_condition(filter))
            .order_by_asc(days::Column::Date)
            .paginate(&self.pool, params.get_page_size());
        let total = paginator.num_items().await?;
        let data = paginator.fetch_page(params.get_page() - 1).await?;
        Ok(PaginatedResponse::new(data, params, total))
    }

    pub async fn count(&self, filter: &NonRewardDayFilter) -> AppResult<u64> {
        let n = days::Entity::find()
            .filter(Self::filter_condition(filter))
            .count(&self.pool)
            .await?;
        Ok(n)
    }

    pub async fn update(
        &self,
        key: &NonRewardDayUnique,
        input: UpdateNonRewardDayInput,
    ) -> AppResult<days::Model> {
        if input.reason.is_none() && input.created_by.is_none() {
            return Err(AppError::ValidationError("No fields to update".to_string()));
        }

        let mut model = self.get(key).await?.into_active_model();
        if let Some(reason) = input.reason {
            model.reason = Set(reason);
        }
        if let Some(created_by) = input.created_by {
            model.created_by = Set(created_by);
        }
        let day = model.update(&self.pool).await?;
        Ok(day)
    }

    pub async fn delete(&self, key: &NonRewardDayUnique) -> AppResult<days::Model> {
        let day = self.get(key).await?;
        days::Entity::delete_by_id(day.id.clone())
            .exec(&self.pool)
            .await?;
        log::info!("Non-reward day removed: {}", day.date);
        Ok(day)
    }
}
