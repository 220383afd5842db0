/// 경매 마감 스케줄러
/// 고정 주기(기본 24시간)로 경매 마감 스윕을 실행한다.
/// 실행이 겹치지 않도록 한 태스크 안에서 순서대로 실행하며,
/// 겹치더라도 조건부 마감 업데이트가 중복 알림을 막는다.
// region:    --- Imports
use crate::auction::finalizer::BidFinalizer;
use chrono::Utc;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info};

// endregion: --- Imports

// region:    --- Finalization Scheduler
/// 경매 마감 스케줄러
pub struct FinalizationScheduler {
    finalizer: Arc<BidFinalizer>,
    period: Duration,
}

impl FinalizationScheduler {
    pub fn new(finalizer: Arc<BidFinalizer>, period: Duration) -> Self {
        Self { finalizer, period }
    }

    /// 스케줄러 시작. 첫 실행은 즉시, 이후 `period`마다.
    pub fn start(&self) -> JoinHandle<()> {
        let finalizer = Arc::clone(&self.finalizer);
        let period = self.period;
        tokio::spawn(async move {
            info!(
                "{:<12} --> 경매 마감 스케줄러 시작: 주기 {}초",
                "Scheduler",
                period.as_secs()
            );
            let mut interval = interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if let Err(e) = finalizer.run(Utc::now()).await {
                    error!("{:<12} --> 경매 마감 스윕 실패: {}", "Scheduler", e);
                }
            }
        })
    }
}
// endregion: --- Finalization Scheduler
