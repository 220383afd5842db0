/// 신규 주문 알림
/// 구매자에게 상품별 판매자 연락처를, 판매자에게 판매 내역을 보낸다.
/// 상품/판매자 누락과 메일 실패는 해당 항목만 건너뛴다.
// region:    --- Imports
use super::model::{Order, FIELD_EMAIL_SENT};
use crate::auction::model::Listing;
use crate::mail::{templates, EmailMessage, Mailer};
use crate::store::{collections, DocumentStore, Filter, Page, StoreError};
use crate::user::{self, Contact};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

// endregion: --- Imports

// region:    --- Outcomes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum OrderStatus {
    Notified,
    /// 이미 메일을 보낸 주문, 다시 보내지 않음
    AlreadySent,
    /// 주문 레코드가 없음
    OrderMissing,
    /// 구매자 레코드가 없음, 메일 발송/완료 표시 모두 생략
    BuyerMissing,
    Malformed(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum OrderFailure {
    ListingLookup { listing_id: String, reason: String },
    MailSend { recipient: String, reason: String },
    MarkSent { reason: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderOutcome {
    pub order_id: String,
    #[serde(flatten)]
    pub status: OrderStatus,
    pub notified: Vec<String>,
    pub failures: Vec<OrderFailure>,
    pub marked_sent: bool,
}

impl OrderOutcome {
    fn new(order_id: &str, status: OrderStatus) -> Self {
        Self {
            order_id: order_id.to_string(),
            status,
            notified: Vec::new(),
            failures: Vec::new(),
            marked_sent: false,
        }
    }
}

/// 판매자별 알림 내용
struct SellerNotice {
    email: String,
    lines: Vec<String>,
}
// endregion: --- Outcomes

// region:    --- Order Notifier
pub struct OrderNotifier {
    store: Arc<dyn DocumentStore>,
    mailer: Arc<dyn Mailer>,
    from_address: String,
    batch_size: usize,
    concurrency: usize,
}

impl OrderNotifier {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        mailer: Arc<dyn Mailer>,
        from_address: impl Into<String>,
        batch_size: usize,
        concurrency: usize,
    ) -> Self {
        Self {
            store,
            mailer,
            from_address: from_address.into(),
            batch_size: batch_size.max(1),
            concurrency: concurrency.max(1),
        }
    }

    /// 주문 생성 이벤트 처리
    pub async fn handle_created(&self, order_id: &str) -> Result<OrderOutcome, StoreError> {
        info!("{:<12} --> 신규 주문 처리: {}", "Order", order_id);
        let Some(document) = self.store.get(collections::ORDERS, order_id).await? else {
            warn!("{:<12} --> 주문 레코드 없음: {}", "Order", order_id);
            return Ok(OrderOutcome::new(order_id, OrderStatus::OrderMissing));
        };
        Ok(match document.decode::<Order>() {
            Ok(order) if order.email_sent => {
                info!("{:<12} --> 이미 발송된 주문, 건너뜀: {}", "Order", order_id);
                OrderOutcome::new(order_id, OrderStatus::AlreadySent)
            }
            Ok(order) => self.notify(order_id, &order).await,
            Err(e) => {
                warn!("{:<12} --> 주문 레코드 해석 실패: {}, {}", "Order", order_id, e);
                OrderOutcome::new(order_id, OrderStatus::Malformed(e.to_string()))
            }
        })
    }

    /// 메일 미발송 주문 일괄 처리. 조회 실패만 에러로 반환한다.
    pub async fn process_pending(&self) -> Result<Vec<OrderOutcome>, StoreError> {
        let filters = [Filter::eq(FIELD_EMAIL_SENT, false)];
        let mut outcomes = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = Page::after(self.batch_size, cursor.take());
            let limit = page.limit;
            let documents = self.store.query(collections::ORDERS, &filters, page).await?;
            let fetched = documents.len();
            cursor = documents.last().map(|doc| doc.id.clone());

            let batch: Vec<OrderOutcome> = stream::iter(documents)
                .map(|doc| async move {
                    match doc.decode::<Order>() {
                        Ok(order) => self.notify(&doc.id, &order).await,
                        Err(e) => OrderOutcome::new(&doc.id, OrderStatus::Malformed(e.to_string())),
                    }
                })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;
            outcomes.extend(batch);

            if fetched < limit {
                break;
            }
        }

        outcomes.sort_by(|a, b| a.order_id.cmp(&b.order_id));
        info!("{:<12} --> 미발송 주문 {}건 처리", "Order", outcomes.len());
        Ok(outcomes)
    }

    /// 주문 한 건 알림
    pub async fn notify(&self, order_id: &str, order: &Order) -> OrderOutcome {
        // 1. 구매자
        let buyer = match user::find_user(self.store.as_ref(), &order.user_id).await {
            Ok(Some(buyer)) => buyer,
            Ok(None) => {
                error!(
                    "{:<12} --> 구매자 정보 없음: order={}, userId={}",
                    "Order", order_id, order.user_id
                );
                return OrderOutcome::new(order_id, OrderStatus::BuyerMissing);
            }
            Err(e) => {
                error!("{:<12} --> 구매자 조회 실패: order={}, {}", "Order", order_id, e);
                return OrderOutcome::new(order_id, OrderStatus::Failed(e.to_string()));
            }
        };
        let buyer_contact = Contact::resolve(Some(&buyer), "A buyer");
        let shipping_address = order.shipping_address();
        let mut outcome = OrderOutcome::new(order_id, OrderStatus::Notified);

        // 2. 상품별 판매자 연락처
        let mut buyer_lines = Vec::new();
        let mut sellers: BTreeMap<String, SellerNotice> = BTreeMap::new();
        for item in &order.items {
            let listing = match self.find_listing(&item.listing_id).await {
                Ok(Some(listing)) => listing,
                Ok(None) => {
                    debug!("{:<12} --> 상품 없음, 건너뜀: {}", "Order", item.listing_id);
                    continue;
                }
                Err(e) => {
                    warn!("{:<12} --> 상품 조회 실패: {}, {}", "Order", item.listing_id, e);
                    outcome.failures.push(OrderFailure::ListingLookup {
                        listing_id: item.listing_id.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            if !sellers.contains_key(&listing.owner_id) {
                let email = self.seller_email(&listing.owner_id).await;
                sellers.insert(
                    listing.owner_id.clone(),
                    SellerNotice {
                        email,
                        lines: Vec::new(),
                    },
                );
            }
            let Some(notice) = sellers.get_mut(&listing.owner_id) else {
                continue;
            };

            buyer_lines.push(format!(
                "{}: Contact seller at {}",
                listing.title, notice.email
            ));
            notice.lines.push(format!(
                "{} (Qty: {}) purchased by {} ({})",
                listing.title, item.quantity, buyer_contact.name, buyer_contact.email
            ));
        }

        // 3. 구매자 메일 (이메일이 있을 때만)
        if let Some(buyer_email) = buyer.email() {
            let message = templates::order_for_buyer(
                &self.from_address,
                buyer_email,
                &buyer_lines,
                shipping_address,
            );
            self.deliver(message, &mut outcome).await;
        }

        // 4. 판매자별 메일
        for notice in sellers.values() {
            let message = templates::order_for_seller(
                &self.from_address,
                &notice.email,
                &notice.lines,
                shipping_address,
            );
            self.deliver(message, &mut outcome).await;
        }

        // 5. 발송 완료 표시 (아직 미발송인 경우에만)
        let unsent = [Filter::ne(FIELD_EMAIL_SENT, true)];
        match self
            .store
            .update(
                collections::ORDERS,
                order_id,
                &unsent,
                json!({ FIELD_EMAIL_SENT: true }),
            )
            .await
        {
            Ok(true) => outcome.marked_sent = true,
            Ok(false) => {
                warn!(
                    "{:<12} --> 다른 처리가 먼저 발송 완료로 표시함: {}",
                    "Order", order_id
                );
            }
            Err(e) => {
                error!("{:<12} --> 발송 완료 표시 실패: {}, {}", "Order", order_id, e);
                outcome.failures.push(OrderFailure::MarkSent {
                    reason: e.to_string(),
                });
            }
        }
        outcome
    }

    async fn find_listing(&self, listing_id: &str) -> Result<Option<Listing>, StoreError> {
        match self.store.get(collections::LISTINGS, listing_id).await? {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }

    async fn seller_email(&self, seller_id: &str) -> String {
        let seller = user::find_user(self.store.as_ref(), seller_id)
            .await
            .unwrap_or_else(|e| {
                warn!("{:<12} --> 판매자 조회 실패: {}, {}", "Order", seller_id, e);
                None
            });
        Contact::resolve(seller.as_ref(), "Seller").email
    }

    async fn deliver(&self, message: EmailMessage, outcome: &mut OrderOutcome) {
        match self.mailer.send(&message).await {
            Ok(()) => {
                info!("{:<12} --> 메일 발송: to={}", "Order", message.to);
                outcome.notified.push(message.to);
            }
            Err(e) => {
                error!("{:<12} --> 메일 발송 실패: to={}, {}", "Order", message.to, e);
                outcome.failures.push(OrderFailure::MailSend {
                    recipient: message.to,
                    reason: e.to_string(),
                });
            }
        }
    }
}
// endregion: --- Order Notifier
