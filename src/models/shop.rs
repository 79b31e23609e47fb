use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Shop {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
    pub website: Option<String>,
    pub owner_id: Option<String>, // shop-owner account allowed to reply to reviews
    pub rating: f64,
    pub review_count: u32,
    pub trust_grade: Option<String>,
}
