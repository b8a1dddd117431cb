//! Typed `PutItem` request bodies.
//!
//! Every attribute carries an explicit type tag, so the store never has to
//! guess: `{"S": ..}` for strings, `{"N": ..}` for numbers (sent as decimal
//! strings, as the protocol requires) and `{"NULL": true}` for a missing
//! referer.

use std::collections::BTreeMap;

use cflogs_core::NormalizedRecord;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AttributeValue {
    S(String),
    N(String),
    #[serde(rename = "NULL")]
    Null(bool),
}

impl AttributeValue {
    fn string(value: &str) -> Self {
        AttributeValue::S(value.to_string())
    }

    fn number(value: i64) -> Self {
        AttributeValue::N(value.to_string())
    }

    fn optional_string(value: Option<&str>) -> Self {
        value.map_or(AttributeValue::Null(true), Self::string)
    }
}

pub type Item = BTreeMap<&'static str, AttributeValue>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PutItemRequest<'a> {
    #[serde(rename = "TableName")]
    pub table_name: &'a str,
    #[serde(rename = "Item")]
    pub item: Item,
}

impl<'a> PutItemRequest<'a> {
    pub fn new(table_name: &'a str, record: &NormalizedRecord) -> Self {
        Self {
            table_name,
            item: encode_item(record),
        }
    }
}

pub fn encode_item(record: &NormalizedRecord) -> Item {
    BTreeMap::from([
        ("visitor_ip", AttributeValue::string(&record.visitor_ip)),
        ("timestamp", AttributeValue::string(&record.timestamp)),
        ("path", AttributeValue::string(&record.path)),
        ("method", AttributeValue::string(&record.method)),
        ("status", AttributeValue::number(record.status)),
        ("user_agent", AttributeValue::string(&record.user_agent)),
        ("referer", AttributeValue::optional_string(record.referer.as_deref())),
        ("expiration_time", AttributeValue::number(record.expiration_time)),
    ])
}
