// SPDX-License-Identifier: AGPL-3.0
// Copyright (C) 2026 GistPub Contributors

//! Encoding and decoding of event batches.

use crate::error::{EventError, EventResult};
use crate::record::{ConvertedGist, Gist};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The codec's own semantic version, shared by every stage binary built from
/// this workspace. Independently released stages interoperate as long as the
/// major version matches.
pub const CODEC_SEMVER: &str = env!("CARGO_PKG_VERSION");

/// A record shape that can travel inside an event batch.
pub trait EventRecord: Serialize + DeserializeOwned {
    /// Closed tag identifying this record shape on the wire
    const RECORD_TYPE: &'static str;

    /// Shape check applied on encode and after decode
    fn check(&self) -> EventResult<()>;
}

impl EventRecord for Gist {
    const RECORD_TYPE: &'static str = "Gist";

    fn check(&self) -> EventResult<()> {
        self.validate()
    }
}

impl EventRecord for ConvertedGist {
    const RECORD_TYPE: &'static str = "ConvertedGist";

    fn check(&self) -> EventResult<()> {
        self.validate()
    }
}

/// The wire envelope around a batch of records.
#[derive(Serialize, Deserialize, Debug)]
struct Envelope {
    semver: String,
    #[serde(rename = "record-type")]
    record_type: String,
    records: Vec<serde_json::Value>,
}

/// Encodes records into a base64 event payload.
///
/// Record order is preserved end-to-end. Fails with [`EventError::Schema`]
/// if any record is missing a required field.
pub fn encode<R: EventRecord>(records: &[R]) -> EventResult<String> {
    let mut values = Vec::with_capacity(records.len());
    for record in records {
        record.check()?;
        values.push(
            serde_json::to_value(record)
                .map_err(|err| EventError::Schema(err.to_string()))?,
        );
    }

    let envelope = Envelope {
        semver: CODEC_SEMVER.to_string(),
        record_type: R::RECORD_TYPE.to_string(),
        records: values,
    };

    let json = serde_json::to_string(&envelope)
        .map_err(|err| EventError::Schema(err.to_string()))?;
    Ok(BASE64.encode(json))
}

/// Decodes a single base64 event payload into records of the expected type.
pub fn decode<R: EventRecord>(payload: &str) -> EventResult<Vec<R>> {
    let bytes = BASE64
        .decode(payload.trim())
        .map_err(|err| EventError::MalformedEvent(format!("invalid base64: {err}")))?;
    let envelope: Envelope = serde_json::from_slice(&bytes)
        .map_err(|err| EventError::MalformedEvent(format!("invalid JSON: {err}")))?;

    check_semver(&envelope.semver)?;

    if envelope.record_type != R::RECORD_TYPE {
        return Err(EventError::UnexpectedRecordType {
            expected: R::RECORD_TYPE.to_string(),
            actual: envelope.record_type,
        });
    }

    let mut records = Vec::with_capacity(envelope.records.len());
    for value in envelope.records {
        let record: R = serde_json::from_value(value)
            .map_err(|err| EventError::Schema(err.to_string()))?;
        record.check()?;
        records.push(record);
    }

    debug!(count = records.len(), record_type = R::RECORD_TYPE, "decoded event batch");
    Ok(records)
}

/// Decodes several independently-encoded batches and concatenates their
/// records, preserving payload order. Lets a stage merge the outputs of
/// parallel upstream discovery runs.
pub fn decode_all<R: EventRecord>(payloads: &[String]) -> EventResult<Vec<R>> {
    let mut records = Vec::new();
    for payload in payloads {
        records.extend(decode::<R>(payload)?);
    }
    Ok(records)
}

/// Resolves an event argument that is either a literal payload or a path to
/// a file containing one. The file probe is best-effort: if probing fails
/// for any reason (for example the payload is far too long to be a valid
/// path), the argument is treated as literal data.
pub fn read_event_arg(arg: &str) -> String {
    // is_file() swallows probe errors (ENAMETOOLONG included) and reports false
    if std::path::Path::new(arg).is_file() {
        if let Ok(contents) = std::fs::read_to_string(arg) {
            return contents.trim().to_string();
        }
    }
    arg.to_string()
}

fn check_semver(batch_semver: &str) -> EventResult<()> {
    let batch = semver::Version::parse(batch_semver)
        .map_err(|err| EventError::MalformedEvent(format!("invalid batch semver: {err}")))?;
    let codec = semver::Version::parse(CODEC_SEMVER)
        .map_err(|err| EventError::MalformedEvent(format!("invalid codec semver: {err}")))?;

    if batch.major != codec.major {
        return Err(EventError::VersionMismatch {
            batch: batch_semver.to_string(),
            codec: CODEC_SEMVER.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::io::Write;
    use std::path::PathBuf;

    fn sample_gists() -> Vec<Gist> {
        vec![
            Gist {
                path: PathBuf::from("docs/a/README.md"),
                commit_id: "abc1234".to_string(),
                tags: BTreeMap::from([(
                    "confluence".to_string(),
                    serde_json::json!({"page": "117", "host": "wiki.example.com"}),
                )]),
                resources: vec!["docs/a:**/*.*".to_string()],
                trace_id: "docs/a/README.md".to_string(),
                title: "a-README.md".to_string(),
            },
            Gist {
                path: PathBuf::from("docs/b/GUIDE.md"),
                commit_id: "abc1234".to_string(),
                tags: BTreeMap::new(),
                resources: vec!["docs/b:**/*.*".to_string()],
                trace_id: "docs/b/GUIDE.md".to_string(),
                title: "b-GUIDE.md".to_string(),
            },
        ]
    }

    #[test]
    fn test_round_trip_preserves_records() {
        let gists = sample_gists();
        let payload = encode(&gists).unwrap();
        let decoded: Vec<Gist> = decode(&payload).unwrap();
        assert_eq!(gists, decoded);
    }

    #[test]
    fn test_round_trip_converted_records() {
        let gist = sample_gists().remove(0);
        let converted = vec![ConvertedGist {
            gist,
            path: PathBuf::from("docs/a/README.jira"),
            title: "a-README.md".to_string(),
            deps: vec![PathBuf::from("docs/a")],
        }];
        let payload = encode(&converted).unwrap();
        let decoded: Vec<ConvertedGist> = decode(&payload).unwrap();
        assert_eq!(converted, decoded);
    }

    #[test]
    fn test_decode_rejects_major_version_mismatch() {
        let payload = encode(&sample_gists()).unwrap();
        let json = String::from_utf8(BASE64.decode(&payload).unwrap()).unwrap();
        let bumped = json.replace(
            &format!("\"semver\":\"{CODEC_SEMVER}\""),
            "\"semver\":\"99.0.0\"",
        );
        let result = decode::<Gist>(&BASE64.encode(bumped));
        assert!(matches!(result, Err(EventError::VersionMismatch { .. })));
    }

    #[test]
    fn test_decode_tolerates_minor_and_patch_difference() {
        let codec = semver::Version::parse(CODEC_SEMVER).unwrap();
        let sibling = format!("{}.{}.{}", codec.major, codec.minor + 3, codec.patch + 7);

        let payload = encode(&sample_gists()).unwrap();
        let json = String::from_utf8(BASE64.decode(&payload).unwrap()).unwrap();
        let bumped = json.replace(
            &format!("\"semver\":\"{CODEC_SEMVER}\""),
            &format!("\"semver\":\"{sibling}\""),
        );
        let decoded: Vec<Gist> = decode(&BASE64.encode(bumped)).unwrap();
        assert_eq!(decoded.len(), 2);
    }

    #[test]
    fn test_decode_rejects_unexpected_record_type() {
        let payload = encode(&sample_gists()).unwrap();
        let result = decode::<ConvertedGist>(&payload);
        assert!(matches!(result, Err(EventError::UnexpectedRecordType { .. })));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode::<Gist>("%%% not base64 %%%"),
            Err(EventError::MalformedEvent(_))
        ));
        assert!(matches!(
            decode::<Gist>(&BASE64.encode("not json")),
            Err(EventError::MalformedEvent(_))
        ));
    }

    #[test]
    fn test_decode_all_concatenates_batches() {
        let gists = sample_gists();
        let first = encode(&gists[..1]).unwrap();
        let second = encode(&gists[1..]).unwrap();
        let merged: Vec<Gist> = decode_all(&[first, second]).unwrap();
        assert_eq!(merged, gists);
    }

    #[test]
    fn test_read_event_arg_from_file() {
        let payload = encode(&sample_gists()).unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{payload}").unwrap();

        let resolved = read_event_arg(file.path().to_str().unwrap());
        assert_eq!(resolved, payload);
    }

    #[test]
    fn test_read_event_arg_literal_passthrough() {
        let payload = encode(&sample_gists()).unwrap();
        assert_eq!(read_event_arg(&payload), payload);
    }
}
