/// 환경 변수 설정
/// main에서 한 번 읽어 각 구성 요소에 명시적으로 전달한다.
// region:    --- Imports
use crate::auction::finalizer::SweepSettings;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

// endregion: --- Imports

// region:    --- Errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },
}
// endregion: --- Errors

// region:    --- Config Model
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub http_addr: String,
    pub kafka: KafkaConfig,
    pub mail: MailConfig,
    pub sweep: SweepConfig,
}

#[derive(Debug, Clone)]
pub struct KafkaConfig {
    pub brokers: String,
    pub group_id: String,
    pub order_topic: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailBackend {
    Smtp,
    Noop,
}

impl FromStr for MailBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "smtp" => Ok(MailBackend::Smtp),
            "noop" => Ok(MailBackend::Noop),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub backend: MailBackend,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_tls: bool,
    pub user: Option<String>,
    pub password: Option<String>,
    pub from_address: String,
}

#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// 실행 주기 (기본 24시간)
    pub interval: Duration,
    pub batch_size: usize,
    pub concurrency: usize,
    pub mutation_retries: u32,
}
// endregion: --- Config Model

// region:    --- Loading
impl AppConfig {
    /// 환경 변수에서 설정 읽기
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mail_backend = parse_or(&get, "MAIL_BACKEND", MailBackend::Smtp)?;
        let user = get("EMAIL_USER");
        let password = get("EMAIL_PASS");
        if mail_backend == MailBackend::Smtp {
            let tls = parse_or(&get, "SMTP_TLS", true)?;
            if tls && user.is_none() {
                return Err(ConfigError::Missing("EMAIL_USER"));
            }
            if tls && password.is_none() {
                return Err(ConfigError::Missing("EMAIL_PASS"));
            }
        }
        let from_address = get("MAIL_FROM")
            .or_else(|| user.clone())
            .unwrap_or_else(|| "noreply@localhost".to_string());

        Ok(Self {
            database_url: get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
            database_max_connections: parse_or(&get, "DATABASE_MAX_CONNECTIONS", 5)?,
            http_addr: get("HTTP_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            kafka: KafkaConfig {
                brokers: get("KAFKA_BROKERS").unwrap_or_else(|| "localhost:9092".to_string()),
                group_id: get("KAFKA_GROUP_ID")
                    .unwrap_or_else(|| "order-notifications".to_string()),
                order_topic: get("ORDER_EVENTS_TOPIC").unwrap_or_else(|| "orders".to_string()),
            },
            mail: MailConfig {
                backend: mail_backend,
                smtp_host: get("SMTP_HOST").unwrap_or_else(|| "smtp.gmail.com".to_string()),
                smtp_port: parse_or(&get, "SMTP_PORT", 465)?,
                smtp_tls: parse_or(&get, "SMTP_TLS", true)?,
                user,
                password,
                from_address,
            },
            sweep: SweepConfig {
                interval: Duration::from_secs(parse_or(&get, "SWEEP_INTERVAL_SECS", 86_400)?),
                batch_size: parse_or(&get, "SWEEP_BATCH_SIZE", 500)?,
                concurrency: parse_or(&get, "SWEEP_CONCURRENCY", 16)?,
                mutation_retries: parse_or(&get, "SWEEP_MUTATION_RETRIES", 2)?,
            },
        })
    }

    pub fn sweep_settings(&self) -> SweepSettings {
        SweepSettings {
            batch_size: self.sweep.batch_size.max(1),
            concurrency: self.sweep.concurrency.max(1),
            mutation_retries: self.sweep.mutation_retries,
            ..SweepSettings::new(self.mail.from_address.clone())
        }
    }
}

fn parse_or<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match get(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}
// endregion: --- Loading
