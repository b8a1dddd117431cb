//! cflogs-dynamo: DynamoDB-compatible store client for cflogs.
//!
//! Speaks the `PutItem` JSON protocol over plain HTTP. Point it at DynamoDB
//! Local or at a signing proxy in front of the hosted service.

pub mod client;
pub mod item;

pub use client::DynamoClient;
pub use item::{AttributeValue, PutItemRequest};
