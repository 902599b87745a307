use sea_orm::{DeriveActiveEnum, EnumIter, FromJsonQueryResult};
use serde::{Deserialize, Serialize};

/// Subscription tier of a user; also keys balances and reward rates.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "plan_type")]
#[serde(rename_all = "camelCase")]
pub enum PlanType {
    #[sea_orm(string_value = "plant")]
    Plant,
    #[sea_orm(string_value = "seed")]
    Seed,
    #[sea_orm(string_value = "tree")]
    Tree,
}

impl std::fmt::Display for PlanType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanType::Plant => write!(f, "plant"),
            PlanType::Seed => write!(f, "seed"),
            PlanType::Tree => write!(f, "tree"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, DeriveActiveEnum, EnumIter)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "withdrawal_type")]
#[serde(rename_all = "camelCase")]
pub enum WithdrawalType {
    #[sea_orm(string_value = "full")]
    Full,
    #[sea_orm(string_value = "rewardOnly")]
    RewardOnly,
}

impl std::fmt::Display for WithdrawalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WithdrawalType::Full => write!(f, "full"),
            WithdrawalType::RewardOnly => write!(f, "rewardOnly"),
        }
    }
}

/// Status shared by deposits and withdrawals.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_status")]
#[serde(rename_all = "camelCase")]
pub enum TransactionStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "proceed")]
    Proceed,
    #[sea_orm(string_value = "failed")]
    Failed,
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "pending"),
            TransactionStatus::Proceed => write!(f, "proceed"),
            TransactionStatus::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, DeriveActiveEnum, EnumIter)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "notification_type")]
#[serde(rename_all = "camelCase")]
pub enum NotificationType {
    #[sea_orm(string_value = "reward")]
    Reward,
    #[sea_orm(string_value = "deposit")]
    Deposit,
    #[sea_orm(string_value = "withdrawal")]
    Withdrawal,
    #[sea_orm(string_value = "system")]
    System,
    #[sea_orm(string_value = "promotion")]
    Promotion,
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationType::Reward => write!(f, "reward"),
            NotificationType::Deposit => write!(f, "deposit"),
            NotificationType::Withdrawal => write!(f, "withdrawal"),
            NotificationType::System => write!(f, "system"),
            NotificationType::Promotion => write!(f, "promotion"),
        }
    }
}

/// Delivery channel. Not a column type of its own: a notification stores its
/// channels as a JSON array of these strings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum NotificationChannel {
    Push,
    Email,
    Sms,
    InApp,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, FromJsonQueryResult)]
#[serde(transparent)]
pub struct NotificationChannels(pub Vec<NotificationChannel>);

impl NotificationChannels {
    pub fn contains(&self, channel: NotificationChannel) -> bool {
        self.0.contains(&channel)
    }
}

impl From<Vec<NotificationChannel>> for NotificationChannels {
    fn from(channels: Vec<NotificationChannel>) -> Self {
        Self(channels)
    }
}
