// region:    --- Imports
use marketplace_notifier::auction::finalizer::BidFinalizer;
use marketplace_notifier::config::{AppConfig, MailBackend, MailConfig};
use marketplace_notifier::database::DatabaseManager;
use marketplace_notifier::handlers::{self, AppState};
use marketplace_notifier::mail::{MailError, Mailer, NoopMailer, SmtpMailer};
use marketplace_notifier::message_broker::KafkaManager;
use marketplace_notifier::order::events::OrderEventConsumer;
use marketplace_notifier::order::notifier::OrderNotifier;
use marketplace_notifier::scheduler::FinalizationScheduler;
use marketplace_notifier::store::{DocumentStore, PostgresDocumentStore};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env 는 선택
    dotenvy::dotenv().ok();

    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    let config = AppConfig::from_env()?;

    // 문서 저장소
    let db_manager =
        DatabaseManager::connect(&config.database_url, config.database_max_connections).await?;
    if let Err(e) = db_manager.initialize_database().await {
        error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> 데이터베이스 초기화 성공", "Main");
    let store: Arc<dyn DocumentStore> =
        Arc::new(PostgresDocumentStore::new(db_manager.get_pool()));

    // 메일 발송기 (프로세스 전체에서 하나를 공유)
    let mailer = build_mailer(&config.mail)?;

    // 경매 마감 스케줄러
    let finalizer = Arc::new(BidFinalizer::new(
        Arc::clone(&store),
        Arc::clone(&mailer),
        config.sweep_settings(),
    ));
    FinalizationScheduler::new(Arc::clone(&finalizer), config.sweep.interval).start();

    // 주문 알림
    let order_notifier = Arc::new(OrderNotifier::new(
        Arc::clone(&store),
        Arc::clone(&mailer),
        config.mail.from_address.clone(),
        config.sweep.batch_size,
        config.sweep.concurrency,
    ));

    // 주문 생성 이벤트 구독
    let kafka_manager = KafkaManager::new(&config.kafka)?;
    if let Err(e) = kafka_manager
        .create_topic(&config.kafka.order_topic, 3, 1)
        .await
    {
        warn!("{:<12} --> 주문 토픽 준비 실패, 구독은 계속: {}", "Main", e);
    }
    let order_consumer = OrderEventConsumer::new(
        Arc::clone(&order_notifier),
        kafka_manager.get_consumer(),
        config.kafka.order_topic.clone(),
    );
    tokio::spawn(async move {
        if let Err(e) = order_consumer.start().await {
            error!("{:<12} --> 주문 이벤트 구독 실패: {}", "Main", e);
        }
    });

    let routes_all = handlers::routes(AppState {
        mailer,
        finalizer,
        order_notifier,
        from_address: config.mail.from_address.clone(),
    });

    let listener = TcpListener::bind(&config.http_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}

fn build_mailer(config: &MailConfig) -> Result<Arc<dyn Mailer>, MailError> {
    let mailer: Arc<dyn Mailer> = match config.backend {
        MailBackend::Noop => Arc::new(NoopMailer),
        MailBackend::Smtp if config.smtp_tls => Arc::new(SmtpMailer::relay(
            &config.smtp_host,
            config.smtp_port,
            config.user.as_deref().unwrap_or_default(),
            config.password.as_deref().unwrap_or_default(),
        )?),
        MailBackend::Smtp => Arc::new(SmtpMailer::plaintext(&config.smtp_host, config.smtp_port)),
    };
    info!(
        "{:<12} --> 메일 백엔드: {:?} ({}:{})",
        "Main", config.backend, config.smtp_host, config.smtp_port
    );
    Ok(mailer)
}
// endregion: --- Main
