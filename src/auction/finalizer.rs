/// 경매 마감 스윕
/// 1. 마감되지 않았고 종료 시각이 지난 경매를 조회
/// 2. 경매별로 독립 처리: 마감 표시 -> 상품 삭제 -> 연락처 조회 -> 낙찰 메일 발송
/// 조회 자체의 실패만 스윕 실패로 보고, 나머지는 경매별 결과에 기록한다.
// region:    --- Imports
use super::model::{Auction, FIELD_END_TIME, FIELD_FINALIZED};
use crate::mail::{templates, EmailMessage, Mailer};
use crate::store::{collections, Document, DocumentStore, Filter, Page, StoreError};
use crate::user::{self, Contact};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

// endregion: --- Imports

// region:    --- Settings
#[derive(Debug, Clone)]
pub struct SweepSettings {
    /// 발신 주소
    pub from_address: String,
    /// 조회 페이지 크기
    pub batch_size: usize,
    /// 동시에 처리하는 경매 수
    pub concurrency: usize,
    /// update/delete 추가 시도 횟수
    pub mutation_retries: u32,
    pub retry_backoff: Duration,
}

impl SweepSettings {
    pub fn new(from_address: impl Into<String>) -> Self {
        Self {
            from_address: from_address.into(),
            batch_size: 500,
            concurrency: 16,
            mutation_retries: 2,
            retry_backoff: Duration::from_millis(200),
        }
    }
}
// endregion: --- Settings

// region:    --- Outcomes
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("failed to select expired auctions: {0}")]
    Selection(#[source] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum FinalizeStatus {
    Finalized,
    /// 조건부 업데이트가 적용되지 않음 (다른 실행이 먼저 마감)
    AlreadyFinalized,
    /// 마감 업데이트 실패, 다음 실행에서 다시 선택됨
    Failed(String),
    /// 레코드 디코딩 실패, 건드리지 않음
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum StepFailure {
    ListingDelete { listing_id: String, reason: String },
    ContactLookup { user_id: String, reason: String },
    MailSend { recipient: String, reason: String },
}

/// 경매 한 건의 처리 결과
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionOutcome {
    pub auction_id: String,
    pub listing_id: Option<String>,
    #[serde(flatten)]
    pub status: FinalizeStatus,
    pub listing_removed: bool,
    /// 발송에 성공한 수신자
    pub notified: Vec<String>,
    pub failures: Vec<StepFailure>,
}

impl AuctionOutcome {
    fn new(auction_id: &str, listing_id: Option<&str>, status: FinalizeStatus) -> Self {
        Self {
            auction_id: auction_id.to_string(),
            listing_id: listing_id.map(str::to_string),
            status,
            listing_removed: false,
            notified: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn mail_failures(&self) -> usize {
        self.failures
            .iter()
            .filter(|f| matches!(f, StepFailure::MailSend { .. }))
            .count()
    }
}

/// 스윕 1회 실행 결과 (경매 id 순)
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepSummary {
    pub outcomes: Vec<AuctionOutcome>,
}

impl SweepSummary {
    pub fn selected_count(&self) -> usize {
        self.outcomes.len()
    }

    pub fn finalized_count(&self) -> usize {
        self.count(|s| matches!(s, FinalizeStatus::Finalized))
    }

    pub fn already_finalized_count(&self) -> usize {
        self.count(|s| matches!(s, FinalizeStatus::AlreadyFinalized))
    }

    pub fn failed_count(&self) -> usize {
        self.count(|s| matches!(s, FinalizeStatus::Failed(_) | FinalizeStatus::Malformed(_)))
    }

    pub fn emails_sent(&self) -> usize {
        self.outcomes.iter().map(|o| o.notified.len()).sum()
    }

    pub fn mail_failures(&self) -> usize {
        self.outcomes.iter().map(AuctionOutcome::mail_failures).sum()
    }

    pub fn outcome(&self, auction_id: &str) -> Option<&AuctionOutcome> {
        self.outcomes.iter().find(|o| o.auction_id == auction_id)
    }

    fn count(&self, predicate: impl Fn(&FinalizeStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| predicate(&o.status)).count()
    }
}
// endregion: --- Outcomes

// region:    --- Bid Finalizer
pub struct BidFinalizer {
    store: Arc<dyn DocumentStore>,
    mailer: Arc<dyn Mailer>,
    settings: SweepSettings,
}

impl BidFinalizer {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        mailer: Arc<dyn Mailer>,
        settings: SweepSettings,
    ) -> Self {
        Self {
            store,
            mailer,
            settings,
        }
    }

    /// 스윕 실행. `now`는 조회 조건에만 사용한다.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<SweepSummary, SweepError> {
        info!("{:<12} --> 경매 마감 처리 시작: now={}", "Finalizer", now);
        let filters = [
            Filter::eq(FIELD_FINALIZED, false),
            Filter::lte(FIELD_END_TIME, now),
        ];

        let mut summary = SweepSummary::default();
        let mut cursor: Option<String> = None;
        loop {
            let page = Page::after(self.settings.batch_size, cursor.take());
            let limit = page.limit;
            let documents = self
                .store
                .query(collections::AUCTIONS, &filters, page)
                .await
                .map_err(|e| {
                    error!("{:<12} --> 마감 대상 조회 실패: {}", "Finalizer", e);
                    SweepError::Selection(e)
                })?;

            let fetched = documents.len();
            cursor = documents.last().map(|doc| doc.id.clone());
            debug!("{:<12} --> 마감 대상 {}건 조회", "Finalizer", fetched);

            let outcomes: Vec<AuctionOutcome> = stream::iter(documents)
                .map(|doc| self.finalize_document(doc))
                .buffer_unordered(self.settings.concurrency.max(1))
                .collect()
                .await;
            summary.outcomes.extend(outcomes);

            if fetched < limit {
                break;
            }
        }

        summary
            .outcomes
            .sort_by(|a, b| a.auction_id.cmp(&b.auction_id));
        info!(
            "{:<12} --> 경매 마감 처리 완료: 선택 {}, 마감 {}, 중복 {}, 실패 {}, 메일 {}건 (실패 {}건)",
            "Finalizer",
            summary.selected_count(),
            summary.finalized_count(),
            summary.already_finalized_count(),
            summary.failed_count(),
            summary.emails_sent(),
            summary.mail_failures()
        );
        Ok(summary)
    }

    async fn finalize_document(&self, document: Document) -> AuctionOutcome {
        match document.decode::<Auction>() {
            Ok(auction) => self.finalize_auction(&document.id, &auction).await,
            Err(e) => {
                warn!(
                    "{:<12} --> 경매 레코드 해석 실패, 건너뜀: id={}, {}",
                    "Finalizer", document.id, e
                );
                AuctionOutcome::new(&document.id, None, FinalizeStatus::Malformed(e.to_string()))
            }
        }
    }

    /// 경매 한 건 처리
    async fn finalize_auction(&self, auction_id: &str, auction: &Auction) -> AuctionOutcome {
        let listing_id = auction.listing_id.as_str();

        // 1. 마감 표시 (아직 마감되지 않은 경우에만)
        let still_open = [Filter::eq(FIELD_FINALIZED, false)];
        let applied = self
            .with_retries("마감 표시", || {
                self.store.update(
                    collections::AUCTIONS,
                    auction_id,
                    &still_open,
                    json!({ FIELD_FINALIZED: true }),
                )
            })
            .await;
        match applied {
            Ok(true) => {}
            Ok(false) => {
                info!(
                    "{:<12} --> 이미 마감된 경매, 알림 생략: id={}",
                    "Finalizer", auction_id
                );
                return AuctionOutcome::new(
                    auction_id,
                    Some(listing_id),
                    FinalizeStatus::AlreadyFinalized,
                );
            }
            Err(e) => {
                error!(
                    "{:<12} --> 경매 마감 표시 실패: id={}, {}",
                    "Finalizer", auction_id, e
                );
                return AuctionOutcome::new(
                    auction_id,
                    Some(listing_id),
                    FinalizeStatus::Failed(e.to_string()),
                );
            }
        }
        let mut outcome =
            AuctionOutcome::new(auction_id, Some(listing_id), FinalizeStatus::Finalized);

        // 2. 상품 삭제 (없어도 성공)
        match self
            .with_retries("상품 삭제", || {
                self.store.delete(collections::LISTINGS, listing_id)
            })
            .await
        {
            Ok(removed) => {
                if !removed {
                    debug!("{:<12} --> 상품이 이미 없음: {}", "Finalizer", listing_id);
                }
                outcome.listing_removed = true;
            }
            Err(e) => {
                warn!(
                    "{:<12} --> 상품 삭제 실패: listing={}, {}",
                    "Finalizer", listing_id, e
                );
                outcome.failures.push(StepFailure::ListingDelete {
                    listing_id: listing_id.to_string(),
                    reason: e.to_string(),
                });
            }
        }

        // 3. 판매자 연락처
        let seller = self
            .resolve_contact(&auction.owner_id, "Seller", &mut outcome)
            .await;

        // 4. 낙찰자가 있을 때만 알림
        let Some(bidder_id) = auction.winning_bidder() else {
            info!(
                "{:<12} --> 입찰 없이 마감: id={}, listing={}",
                "Finalizer", auction_id, listing_id
            );
            return outcome;
        };
        let bidder = self.resolve_contact(bidder_id, "Bidder", &mut outcome).await;

        let from = self.settings.from_address.as_str();
        let messages = [
            templates::auction_ended_for_seller(from, listing_id, &seller, &bidder),
            templates::auction_won_for_bidder(from, listing_id, &seller, &bidder),
        ];
        for message in messages {
            self.deliver(message, &mut outcome).await;
        }

        if outcome.mail_failures() == 0 {
            info!("{:<12} --> 낙찰 메일 발송 완료: listing={}", "Finalizer", listing_id);
        }
        outcome
    }

    async fn resolve_contact(
        &self,
        user_id: &str,
        default_name: &str,
        outcome: &mut AuctionOutcome,
    ) -> Contact {
        match user::find_user(self.store.as_ref(), user_id).await {
            Ok(found) => {
                if found.is_none() {
                    warn!(
                        "{:<12} --> 사용자 없음, 기본 연락처 사용: {}",
                        "Finalizer", user_id
                    );
                }
                Contact::resolve(found.as_ref(), default_name)
            }
            Err(e) => {
                warn!(
                    "{:<12} --> 사용자 조회 실패, 기본 연락처 사용: {}, {}",
                    "Finalizer", user_id, e
                );
                outcome.failures.push(StepFailure::ContactLookup {
                    user_id: user_id.to_string(),
                    reason: e.to_string(),
                });
                Contact::resolve(None, default_name)
            }
        }
    }

    /// 수신자별로 실패를 격리
    async fn deliver(&self, message: EmailMessage, outcome: &mut AuctionOutcome) {
        match self.mailer.send(&message).await {
            Ok(()) => {
                debug!("{:<12} --> 메일 발송: to={}", "Finalizer", message.to);
                outcome.notified.push(message.to);
            }
            Err(e) => {
                error!(
                    "{:<12} --> 메일 발송 실패: to={}, listing={}, {}",
                    "Finalizer",
                    message.to,
                    outcome.listing_id.as_deref().unwrap_or_default(),
                    e
                );
                outcome.failures.push(StepFailure::MailSend {
                    recipient: message.to,
                    reason: e.to_string(),
                });
            }
        }
    }

    async fn with_retries<T, F, Fut>(&self, step: &str, mut op: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.settings.mutation_retries => {
                    attempt += 1;
                    warn!(
                        "{:<12} --> {} 실패, 재시도 {}/{}: {}",
                        "Finalizer", step, attempt, self.settings.mutation_retries, e
                    );
                    tokio::time::sleep(self.settings.retry_backoff * attempt).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
// endregion: --- Bid Finalizer

// endregion: --- Tests
