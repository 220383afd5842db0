pub mod auction;
pub mod config;
pub mod database;
pub mod handlers;
pub mod mail;
pub mod message_broker;
pub mod order;
pub mod report;
pub mod scheduler;
pub mod store;
pub mod user;
