//! Range reconciliation engine.
//!
//! One inbound frame produces exactly one response volley: either a full
//! `state` dump (`no_data`) or one checksum subdivision step
//! (`checksum_fail`). The engine keeps no state between frames; the peer
//! drives convergence by answering a mismatching half with another
//! `checksum_fail` over the narrower bounds.
//!
//! Rows are folded into the hashers as they stream off the dataset, so a
//! range of any size costs constant memory.

use serde_json::Value;

use rangesync_core::checksum::RangeHasher;
use rangesync_core::codec::{SyncInput, SyncOp};
use rangesync_core::config::SyncConfig;
use rangesync_core::messages::{self, IntegrityKind, RangeDigest};
use rangesync_store::Row;

use crate::error::{Result, SyncError};
use crate::registry::Registration;

/// Serve one decoded frame against a registration.
///
/// On error nothing past the failure point has been emitted; the caller
/// logs and drops the frame.
pub(crate) async fn respond(registration: &Registration, input: &SyncInput) -> Result<()> {
    match input.op {
        SyncOp::NoData => send_all(registration).await,
        SyncOp::ChecksumFail => send_checksum_ranges(registration, input).await,
    }
}

/// `no_data`: the peer is empty, dump every row as a `state` envelope in
/// index order.
async fn send_all(registration: &Registration) -> Result<()> {
    let query = registration.config.no_data_query();
    let mut failure = None;

    registration
        .dataset
        .for_each(&query, &mut |row| match state_message(&registration.config, &row) {
            Ok(message) => {
                registration.emit(message);
                true
            }
            Err(e) => {
                failure = Some(e);
                false
            }
        })
        .await?;

    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// `checksum_fail`: narrow the divergent range `[begin, end]` by one
/// subdivision step.
async fn send_checksum_ranges(registration: &Registration, input: &SyncInput) -> Result<()> {
    let config = &registration.config;
    let count = registration
        .dataset
        .count_range(
            &config.count_range_query(),
            &config.count_range_query_json.count_field_name,
            &input.begin,
            &input.end,
        )
        .await?;

    match count {
        0 => {
            registration.emit(messages::integrity_envelope(
                &config.component,
                IntegrityKind::Clear,
                input.id,
                None,
            ));
            Ok(())
        }
        1 => send_single(registration, input).await,
        _ => send_split(registration, input, count).await,
    }
}

/// Singleton range: the row itself, then a global check over it so the peer
/// can confirm convergence. State-then-global ordering is a protocol
/// requirement.
async fn send_single(registration: &Registration, input: &SyncInput) -> Result<()> {
    let config = &registration.config;
    let row = registration
        .dataset
        .row_by_index(&config.row_data_query(), &input.begin)
        .await?
        .ok_or(SyncError::RangeSizeMismatch {
            expected: 1,
            got: 0,
        })?;

    // Resolve both messages before emitting either, so a malformed row
    // produces no partial volley.
    let state = state_message(config, &row)?;
    let mut hasher = RangeHasher::new();
    hasher.update(checksum_text(column(&row, &config.checksum_field)?).as_bytes());

    registration.emit(state);
    let digest = RangeDigest {
        begin: input.begin.clone(),
        end: input.end.clone(),
        checksum: hasher.finish_hex(),
        tail: None,
    };
    registration.emit(messages::integrity_envelope(
        &config.component,
        IntegrityKind::CheckGlobal,
        input.id,
        Some(&digest),
    ));
    Ok(())
}

/// Two or more rows: stream them once, hashing the smaller left half and
/// the right half separately, and answer with both half-range checks.
async fn send_split(registration: &Registration, input: &SyncInput, count: u64) -> Result<()> {
    let config = &registration.config;
    let mut split = SplitAccumulator::new(config, count);

    registration
        .dataset
        .for_each_range(
            &config.range_checksum_query(),
            &input.begin,
            &input.end,
            &mut |row| split.push(row),
        )
        .await?;

    let (left, right) = split.finish()?;
    registration.emit(messages::integrity_envelope(
        &config.component,
        IntegrityKind::CheckLeft,
        input.id,
        Some(&left),
    ));
    registration.emit(messages::integrity_envelope(
        &config.component,
        IntegrityKind::CheckRight,
        input.id,
        Some(&right),
    ));
    Ok(())
}

/// Streaming split state: two hashers plus the boundary keys observed so
/// far. The left half takes the first `⌊count/2⌋` rows.
struct SplitAccumulator<'a> {
    config: &'a SyncConfig,
    expected: u64,
    left_len: u64,
    seen: u64,
    left: RangeHasher,
    right: RangeHasher,
    left_begin: Option<String>,
    left_end: Option<String>,
    right_begin: Option<String>,
    right_end: Option<String>,
    failure: Option<SyncError>,
}

impl<'a> SplitAccumulator<'a> {
    fn new(config: &'a SyncConfig, expected: u64) -> Self {
        Self {
            config,
            expected,
            left_len: expected / 2,
            seen: 0,
            left: RangeHasher::new(),
            right: RangeHasher::new(),
            left_begin: None,
            left_end: None,
            right_begin: None,
            right_end: None,
            failure: None,
        }
    }

    /// Fold one row; returns `false` to stop the stream after a failure.
    fn push(&mut self, row: Row) -> bool {
        match self.fold(&row) {
            Ok(()) => true,
            Err(e) => {
                self.failure = Some(e);
                false
            }
        }
    }

    fn fold(&mut self, row: &Row) -> Result<()> {
        let key = checksum_text(column(row, &self.config.index)?);
        let digest_input = checksum_text(column(row, &self.config.checksum_field)?);

        if self.seen < self.left_len {
            self.left.update(digest_input.as_bytes());
            if self.seen == 0 {
                self.left_begin = Some(key.clone());
            }
            if self.seen + 1 == self.left_len {
                self.left_end = Some(key);
            }
        } else {
            self.right.update(digest_input.as_bytes());
            if self.seen == self.left_len {
                self.right_begin = Some(key.clone());
            }
            self.right_end = Some(key);
        }
        self.seen += 1;
        Ok(())
    }

    fn finish(self) -> Result<(RangeDigest, RangeDigest)> {
        if let Some(failure) = self.failure {
            return Err(failure);
        }
        if self.seen != self.expected {
            return Err(SyncError::RangeSizeMismatch {
                expected: self.expected,
                got: self.seen,
            });
        }
        let (Some(left_begin), Some(left_end), Some(right_begin), Some(right_end)) = (
            self.left_begin,
            self.left_end,
            self.right_begin,
            self.right_end,
        ) else {
            return Err(SyncError::RangeSizeMismatch {
                expected: self.expected,
                got: self.seen,
            });
        };

        let left = RangeDigest {
            begin: left_begin,
            end: left_end,
            checksum: self.left.finish_hex(),
            // The peer treats the right half's first key as the boundary.
            tail: Some(right_begin.clone()),
        };
        let right = RangeDigest {
            begin: right_begin,
            end: right_end,
            checksum: self.right.finish_hex(),
            tail: None,
        };
        Ok((left, right))
    }
}

fn state_message(config: &SyncConfig, row: &Row) -> Result<String> {
    let index = column(row, &config.index)?;
    let timestamp = column(row, &config.last_event)?;
    Ok(messages::state_envelope(
        &config.component,
        index,
        timestamp,
        row,
    ))
}

fn column<'r>(row: &'r Row, name: &str) -> Result<&'r Value> {
    row.get(name)
        .ok_or_else(|| SyncError::MissingColumn(name.to_string()))
}

/// Keys and checksum inputs are fed as text; non-string column values use
/// their JSON rendering.
fn checksum_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
