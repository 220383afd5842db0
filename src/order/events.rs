// region:    --- Imports
use super::notifier::OrderNotifier;
use crate::message_broker::{BrokerError, KafkaConsumer};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

// endregion: --- Imports

// region:    --- Order Events
/// 주문 생성 이벤트
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreated {
    pub order_id: String,
}
// endregion: --- Order Events

// region:    --- Order Event Consumer
/// 주문 생성 이벤트 구독자
pub struct OrderEventConsumer {
    notifier: Arc<OrderNotifier>,
    kafka_consumer: Arc<KafkaConsumer>,
    topic: String,
}

impl OrderEventConsumer {
    pub fn new(
        notifier: Arc<OrderNotifier>,
        kafka_consumer: Arc<KafkaConsumer>,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            notifier,
            kafka_consumer,
            topic: topic.into(),
        }
    }

    /// 구독 시작 (반환하지 않음)
    pub async fn start(&self) -> Result<(), BrokerError> {
        let notifier = Arc::clone(&self.notifier);
        self.kafka_consumer
            .consume_events(&self.topic, move |event: OrderCreated| {
                let notifier = Arc::clone(&notifier);
                async move {
                    match notifier.handle_created(&event.order_id).await {
                        Ok(outcome) => info!(
                            "{:<12} --> 주문 이벤트 처리 완료: order={}, 발송 {}건, 실패 {}건",
                            "Consumer",
                            outcome.order_id,
                            outcome.notified.len(),
                            outcome.failures.len()
                        ),
                        Err(e) => error!(
                            "{:<12} --> 주문 이벤트 처리 오류: order={}, {}",
                            "Consumer", event.order_id, e
                        ),
                    }
                }
            })
            .await
    }
}
// endregion: --- Order Event Consumer

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_created_payload_uses_camel_case() {
        let event: OrderCreated = serde_json::from_str(r#"{"orderId":"O1"}"#).unwrap();
        assert_eq!(event.order_id, "O1");
    }
}
