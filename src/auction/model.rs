use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 경매 마감 여부 필드
pub const FIELD_FINALIZED: &str = "bidFinalized";
/// 경매 종료 시각 필드
pub const FIELD_END_TIME: &str = "bidEndTime";

// 경매 모델
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Auction {
    pub listing_id: String,
    pub owner_id: String,
    #[serde(rename = "bidFinalized", default)]
    pub finalized: bool,
    #[serde(rename = "bidEndTime")]
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub current_highest_bidder_id: Option<String>,
}

impl Auction {
    /// 낙찰자 (입찰이 없었으면 None)
    pub fn winning_bidder(&self) -> Option<&str> {
        self.current_highest_bidder_id
            .as_deref()
            .filter(|id| !id.is_empty())
    }
}

// 상품 모델
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub title: String,
    pub owner_id: String,
}
