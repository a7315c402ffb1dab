//! Prometheus Remote Write 2.0 wire format
//!
//! Hand-written prost message types for `io.prometheus.write.v2.Request`
//! plus the snappy raw-block framing the protocol mandates. Tags and field
//! semantics follow the upstream `types.proto`; fields 1-3 of `Request` are
//! reserved by the protocol and therefore absent here.
//!
//! All symbol references (`labels_refs`, `help_ref`, `unit_ref`) index into
//! `Request.symbols`. The relay stages only ever append to that table, so
//! payload-side references stay valid without the stages knowing about them.

use prost::Message;
use thiserror::Error;

/// One remote write batch: a shared symbol table plus the series that
/// reference it.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WriteRequest {
    /// Deduplicated strings; position is the reference. Index 0 is the empty
    /// string by convention on the wire.
    #[prost(string, repeated, tag = "4")]
    pub symbols: Vec<String>,
    #[prost(message, repeated, tag = "5")]
    pub timeseries: Vec<TimeSeries>,
}

/// A single series: flat (name, value) symbol-reference pairs plus the
/// sample payload, which the relay carries through untouched.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TimeSeries {
    #[prost(uint32, repeated, tag = "1")]
    pub labels_refs: Vec<u32>,
    #[prost(message, repeated, tag = "2")]
    pub samples: Vec<Sample>,
    #[prost(message, repeated, tag = "3")]
    pub histograms: Vec<Histogram>,
    #[prost(message, repeated, tag = "4")]
    pub exemplars: Vec<Exemplar>,
    #[prost(message, optional, tag = "5")]
    pub metadata: Option<Metadata>,
    #[prost(int64, tag = "6")]
    pub created_timestamp: i64,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct Sample {
    #[prost(double, tag = "1")]
    pub value: f64,
    /// Milliseconds since epoch
    #[prost(int64, tag = "2")]
    pub timestamp: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Exemplar {
    #[prost(uint32, repeated, tag = "1")]
    pub labels_refs: Vec<u32>,
    #[prost(double, tag = "2")]
    pub value: f64,
    #[prost(int64, tag = "3")]
    pub timestamp: i64,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct Metadata {
    #[prost(enumeration = "metadata::MetricType", tag = "1")]
    pub r#type: i32,
    #[prost(uint32, tag = "3")]
    pub help_ref: u32,
    #[prost(uint32, tag = "4")]
    pub unit_ref: u32,
}

pub mod metadata {
    #[derive(
        Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration,
    )]
    #[repr(i32)]
    pub enum MetricType {
        Unspecified = 0,
        Counter = 1,
        Gauge = 2,
        Histogram = 3,
        Gaugehistogram = 4,
        Summary = 5,
        Info = 6,
        Stateset = 7,
    }
}

/// Native histogram payload, carried through opaquely.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Histogram {
    #[prost(oneof = "histogram::Count", tags = "1, 2")]
    pub count: Option<histogram::Count>,
    #[prost(double, tag = "3")]
    pub sum: f64,
    #[prost(sint32, tag = "4")]
    pub schema: i32,
    #[prost(double, tag = "5")]
    pub zero_threshold: f64,
    #[prost(oneof = "histogram::ZeroCount", tags = "6, 7")]
    pub zero_count: Option<histogram::ZeroCount>,
    #[prost(message, repeated, tag = "8")]
    pub negative_spans: Vec<BucketSpan>,
    #[prost(sint64, repeated, tag = "9")]
    pub negative_deltas: Vec<i64>,
    #[prost(double, repeated, tag = "10")]
    pub negative_counts: Vec<f64>,
    #[prost(message, repeated, tag = "11")]
    pub positive_spans: Vec<BucketSpan>,
    #[prost(sint64, repeated, tag = "12")]
    pub positive_deltas: Vec<i64>,
    #[prost(double, repeated, tag = "13")]
    pub positive_counts: Vec<f64>,
    #[prost(enumeration = "histogram::ResetHint", tag = "14")]
    pub reset_hint: i32,
    #[prost(int64, tag = "15")]
    pub timestamp: i64,
    #[prost(double, repeated, tag = "16")]
    pub custom_values: Vec<f64>,
}

pub mod histogram {
    #[derive(Clone, Copy, PartialEq, ::prost::Oneof)]
    pub enum Count {
        #[prost(uint64, tag = "1")]
        CountInt(u64),
        #[prost(double, tag = "2")]
        CountFloat(f64),
    }

    #[derive(Clone, Copy, PartialEq, ::prost::Oneof)]
    pub enum ZeroCount {
        #[prost(uint64, tag = "6")]
        ZeroCountInt(u64),
        #[prost(double, tag = "7")]
        ZeroCountFloat(f64),
    }

    #[derive(
        Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration,
    )]
    #[repr(i32)]
    pub enum ResetHint {
        Unknown = 0,
        Yes = 1,
        No = 2,
        Gauge = 3,
    }
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct BucketSpan {
    #[prost(sint32, tag = "1")]
    pub offset: i32,
    #[prost(uint32, tag = "2")]
    pub length: u32,
}

// ============================================================================
// FRAMING
// ============================================================================

/// Wire-level decode failure for an inbound body
#[derive(Error, Debug)]
pub enum WireError {
    #[error("snappy: {0}")]
    Snappy(#[from] snap::Error),
    #[error("protobuf decode: {0}")]
    Decode(#[from] prost::DecodeError),
}

/// Encode a batch and compress it with raw-block snappy, ready to send.
pub fn encode_snappy(request: &WriteRequest) -> Result<Vec<u8>, snap::Error> {
    snap::raw::Encoder::new().compress_vec(&request.encode_to_vec())
}

/// Decompress and decode an inbound remote write body.
pub fn decode_snappy(body: &[u8]) -> Result<WriteRequest, WireError> {
    let raw = snap::raw::Decoder::new().decompress_vec(body)?;
    Ok(WriteRequest::decode(raw.as_slice())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request() -> WriteRequest {
        WriteRequest {
            symbols: vec![
                "".to_string(),
                "__name__".to_string(),
                "http_requests_total".to_string(),
            ],
            timeseries: vec![TimeSeries {
                labels_refs: vec![1, 2],
                samples: vec![Sample {
                    value: 42.0,
                    timestamp: 1_700_000_000_000,
                }],
                ..Default::default()
            }],
        }
    }

    #[test]
    fn test_snappy_round_trip() {
        let request = sample_request();
        let body = encode_snappy(&request).unwrap();
        let decoded = decode_snappy(&body).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn test_symbols_use_field_four() {
        // Request fields 1-3 are reserved; symbols must land on tag 4
        // (wire type 2), i.e. key byte 0x22.
        let request = WriteRequest {
            symbols: vec!["a".to_string()],
            timeseries: vec![],
        };
        let bytes = request.encode_to_vec();
        assert_eq!(bytes[0], 0x22);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_snappy(b"definitely not snappy").is_err());
    }

    #[test]
    fn test_payload_survives_label_rewrite() {
        // Rewriting labels_refs must not disturb the sample payload.
        let mut request = sample_request();
        let before = request.timeseries[0].samples.clone();
        request.timeseries[0].labels_refs = vec![1, 2, 1, 2];
        assert_eq!(request.timeseries[0].samples, before);
    }
}
