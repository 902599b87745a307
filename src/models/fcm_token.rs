use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FcmTokenUnique {
    Id(String),
    Token(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterTokenInput {
    pub user_id: String,
    pub token: String,
    pub platform: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FcmTokenFilter {
    pub user_id: Option<String>,
    pub platform: Option<String>,
}
