use serde::{Deserialize, Serialize};

/// 메일 발송 완료 필드
pub const FIELD_EMAIL_SENT: &str = "emailSent";

// 주문 모델
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub user_id: String,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub shipping_address: Option<String>,
    #[serde(default)]
    pub email_sent: bool,
}

// 주문 상품
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub listing_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

impl Order {
    pub fn shipping_address(&self) -> &str {
        self.shipping_address
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .unwrap_or("Shipping address not provided.")
    }
}
