#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use marketplace_notifier::auction::finalizer::{BidFinalizer, SweepSettings};
use marketplace_notifier::mail::{EmailMessage, MailError, Mailer};
use marketplace_notifier::store::{collections, MemoryDocumentStore};
use serde_json::json;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

pub const FROM: &str = "noreply@market.example";

/// 트레이싱 초기화 (테스트 바이너리당 한 번)
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .without_time()
            .with_target(false)
            .with_test_writer()
            .try_init();
    });
}

/// 보낸 메일을 기록하는 발송기. 지정한 수신자에 대해서는 실패한다.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingMailer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_for(&self, recipient: &str) {
        self.failing.lock().unwrap().insert(recipient.to_string());
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, recipient: &str) -> Vec<EmailMessage> {
        self.sent()
            .into_iter()
            .filter(|m| m.to == recipient)
            .collect()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        if self.failing.lock().unwrap().contains(&message.to) {
            return Err(MailError::Transport(format!(
                "550 mailbox unavailable: {}",
                message.to
            )));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

pub fn finalizer(store: &Arc<MemoryDocumentStore>, mailer: &Arc<RecordingMailer>) -> BidFinalizer {
    let mut settings = SweepSettings::new(FROM);
    settings.retry_backoff = Duration::ZERO;
    BidFinalizer::new(store.clone(), mailer.clone(), settings)
}

pub fn insert_auction(
    store: &MemoryDocumentStore,
    id: &str,
    listing_id: &str,
    owner_id: &str,
    end_time: DateTime<Utc>,
    bidder: Option<&str>,
    finalized: bool,
) {
    store.insert(
        collections::AUCTIONS,
        id,
        json!({
            "listingId": listing_id,
            "ownerId": owner_id,
            "bidEndTime": end_time.to_rfc3339(),
            "currentHighestBidderId": bidder,
            "bidFinalized": finalized,
        }),
    );
}

pub fn insert_listing(store: &MemoryDocumentStore, id: &str, title: &str, owner_id: &str) {
    store.insert(
        collections::LISTINGS,
        id,
        json!({ "title": title, "ownerId": owner_id }),
    );
}

pub fn insert_user(store: &MemoryDocumentStore, id: &str, name: &str, email: &str) {
    store.insert(
        collections::USERS,
        id,
        json!({ "name": name, "email": email }),
    );
}

pub fn is_finalized(store: &MemoryDocumentStore, id: &str) -> bool {
    store
        .snapshot(collections::AUCTIONS, id)
        .and_then(|doc| doc["bidFinalized"].as_bool())
        .unwrap_or(false)
}
