//! Static log corpora used across harnesses.
//!
//! Each corpus is a `&'static [&'static str]` of decoded CloudFront lines.

/// The reference line and its expected normalized form.
pub const REFERENCE_LINE: &str =
    "1700000000.123\t203.0.113.5\tGET\t/index.html\t200\tMozilla%2F5.0\t-";

/// Lines that normalize to a record.
pub const CORPUS_VALID: &[&str] = &[
    REFERENCE_LINE,
    "1700000001.000\t198.51.100.7\tPOST\t/api/v1/orders\t201\tcurl%2F8.4.0\thttps%3A%2F%2Fshop.example.com%2Fcart",
    "1700000002.5\t2001:db8::1\tHEAD\t/healthz\t204\tkube-probe%2F1.28\t-",
    "1700000003\t192.0.2.44\t\t/missing-method\t404\t\t",
    "1700000004.999\t192.0.2.45\tGET\t/redirect\t301\tMozilla%2F5.0%20(X11%3B%20Linux)\t-\tIAD89-C1\tHit",
    "1700000005\t192.0.2.46\tGET\t/no-status",
];

/// Lines missing a timestamp, IP or URI.
pub const CORPUS_SKIPPED: &[&str] = &[
    "",
    "\t203.0.113.5\tGET\t/index.html\t200",
    "1700000000\t\tGET\t/index.html\t200",
    "1700000000\t203.0.113.5\tGET\t\t200",
    "1700000000\t203.0.113.5\tGET",
    "1700000000",
];

/// Complete lines whose fields cannot be decoded.
pub const CORPUS_MALFORMED: &[&str] = &[
    "1700000000\t203.0.113.5\tGET\t/\t200\tMozilla%2\t-",
    "1700000000\t203.0.113.5\tGET\t/\t200\tcurl\t%E0%A4%A",
    "1700000000\t203.0.113.5\tGET\t/\t200\t%C3%28\t-",
    "not-a-time\t203.0.113.5\tGET\t/\t200\tcurl\t-",
];

/// A Kinesis stream event document, pretty-printed, with two records.
pub fn sample_event_json() -> String {
    let batch = super::batch_of_lines(&CORPUS_VALID[..2]);
    let mut event = serde_json::to_value(&batch).unwrap();
    for (i, record) in event["Records"].as_array_mut().unwrap().iter_mut().enumerate() {
        record["eventID"] = format!("shardId-000000000000:{i}").into();
        record["eventSource"] = "aws:kinesis".into();
        record["kinesis"]["partitionKey"] = "cloudfront".into();
        record["kinesis"]["sequenceNumber"] = format!("4958{i}").into();
    }
    serde_json::to_string_pretty(&event).unwrap()
}
