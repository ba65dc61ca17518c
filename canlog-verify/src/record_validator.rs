//! 帧记录校验器
//!
//! 按标识符检查发送周期、心跳递增和异或校验。与解码引擎无关，
//! 直接从原始负载的固定位置取心跳字节和校验字节。

use canlog_core::utils::xor_checksum;
use canlog_core::RawFrameRecord;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info};

use crate::profile::ProfileTable;

/// 周期容差（毫秒），源时钟按整数截断
pub const PERIOD_TOLERANCE_MS: i64 = 1;

/// 两个时间戳之间的有符号间隔，超出 i64 时饱和
fn interval_ms(previous: u64, current: u64) -> i64 {
    let diff = i128::from(current) - i128::from(previous);
    i64::try_from(diff).unwrap_or(if diff > 0 { i64::MAX } else { i64::MIN })
}

/// 校验发现的问题
///
/// 只是诊断信息，不会中断校验
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationFinding {
    /// 实际间隔偏离期望周期超过容差
    PeriodMismatch {
        identifier: u32,
        timestamp: u64,
        actual_ms: i64,
        expected_ms: u64,
    },
    /// 心跳没有按1递增
    HeartbeatMismatch {
        identifier: u32,
        timestamp: u64,
        actual: u8,
        expected: u8,
    },
    /// 异或校验不一致
    ChecksumMismatch {
        identifier: u32,
        timestamp: u64,
        computed: u8,
        stored: u8,
    },
    /// 负载不够长，取不到配置的字节
    ShortPayload {
        identifier: u32,
        timestamp: u64,
        needed: usize,
        actual: usize,
    },
}

impl ValidationFinding {
    pub fn identifier(&self) -> u32 {
        match self {
            ValidationFinding::PeriodMismatch { identifier, .. }
            | ValidationFinding::HeartbeatMismatch { identifier, .. }
            | ValidationFinding::ChecksumMismatch { identifier, .. }
            | ValidationFinding::ShortPayload { identifier, .. } => *identifier,
        }
    }

    pub fn timestamp(&self) -> u64 {
        match self {
            ValidationFinding::PeriodMismatch { timestamp, .. }
            | ValidationFinding::HeartbeatMismatch { timestamp, .. }
            | ValidationFinding::ChecksumMismatch { timestamp, .. }
            | ValidationFinding::ShortPayload { timestamp, .. } => *timestamp,
        }
    }
}

impl fmt::Display for ValidationFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationFinding::PeriodMismatch {
                identifier,
                timestamp,
                actual_ms,
                expected_ms,
            } => write!(
                f,
                "Period error: {identifier:X} at {timestamp}ms, actual interval {actual_ms}ms, expected {expected_ms}ms"
            ),
            ValidationFinding::HeartbeatMismatch {
                identifier,
                timestamp,
                actual,
                expected,
            } => write!(
                f,
                "Heartbeat error: {identifier:X} at {timestamp}ms, value {actual}, expected {expected}"
            ),
            ValidationFinding::ChecksumMismatch {
                identifier,
                timestamp,
                computed,
                stored,
            } => write!(
                f,
                "XOR error: {identifier:X} at {timestamp}ms, computed {computed:02X}, stored {stored:02X}"
            ),
            ValidationFinding::ShortPayload {
                identifier,
                timestamp,
                needed,
                actual,
            } => write!(
                f,
                "Short payload: {identifier:X} at {timestamp}ms, needs {needed} byte(s), got {actual}"
            ),
        }
    }
}

/// 每条记录一行的状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordStatus {
    pub identifier: u32,
    pub timestamp: u64,
    pub time_diff: Option<i64>,
    pub heartbeat: Option<u8>,
    pub expected_heartbeat: Option<u8>,
    pub ok: bool,
}

impl RecordStatus {
    pub fn status_label(&self) -> &'static str {
        if self.ok {
            "OK"
        } else {
            "ERR"
        }
    }
}

fn dash_or<T: fmt::Display>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map_or_else(|| "-".to_string(), ToString::to_string)
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<12} {:<12} {:<12} {:<12} {:<12}",
            format!("{:X}", self.identifier),
            dash_or(&self.time_diff),
            dash_or(&self.heartbeat),
            dash_or(&self.expected_heartbeat),
            self.status_label()
        )
    }
}

/// 单条记录的校验结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordCheck {
    pub status: RecordStatus,
    pub findings: Vec<ValidationFinding>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct IdentifierState {
    last_timestamp: u64,
    last_heartbeat: Option<u8>,
    /// 上一帧心跳出错时原本期望的值
    missed_heartbeat: Option<u8>,
}

/// 一次校验运行的状态：每个标识符的上次时间戳和上次心跳
///
/// 未出现过的标识符处于 Unseen，第一次出现后进入 Seen
#[derive(Debug, Clone, Default)]
pub struct ValidationState {
    seen: HashMap<u32, IdentifierState>,
}

impl ValidationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_seen(&self, identifier: u32) -> bool {
        self.seen.contains_key(&identifier)
    }

    pub fn last_timestamp(&self, identifier: u32) -> Option<u64> {
        self.seen.get(&identifier).map(|s| s.last_timestamp)
    }

    pub fn last_heartbeat(&self, identifier: u32) -> Option<u8> {
        self.seen.get(&identifier).and_then(|s| s.last_heartbeat)
    }
}

/// 整次运行的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub statuses: Vec<RecordStatus>,
    pub findings: Vec<ValidationFinding>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.findings.iter().map(ToString::to_string).collect()
    }
}

/// 帧记录校验器
pub struct RecordValidator {
    profiles: ProfileTable,
}

impl Default for RecordValidator {
    fn default() -> Self {
        Self::new(ProfileTable::gateway_defaults())
    }
}

impl RecordValidator {
    pub fn new(profiles: ProfileTable) -> Self {
        Self { profiles }
    }

    pub fn profiles(&self) -> &ProfileTable {
        &self.profiles
    }

    /// 校验一条记录并推进状态
    ///
    /// 第一次出现的标识符只记录状态，不做周期和心跳检查；
    /// 异或校验与是否出现过无关。
    pub fn step(&self, state: &mut ValidationState, record: &RawFrameRecord) -> RecordCheck {
        let identifier = record.identifier;
        let timestamp = record.timestamp;
        let profile = self.profiles.get(identifier).copied().unwrap_or_default();
        let previous = state.seen.get(&identifier).copied();
        let mut findings = Vec::new();

        // 周期
        let time_diff = previous.map(|prev| interval_ms(prev.last_timestamp, timestamp));
        if let (Some(actual_ms), Some(expected_ms)) = (time_diff, profile.period_ms) {
            if (i128::from(actual_ms) - i128::from(expected_ms)).abs()
                > i128::from(PERIOD_TOLERANCE_MS)
            {
                findings.push(ValidationFinding::PeriodMismatch {
                    identifier,
                    timestamp,
                    actual_ms,
                    expected_ms,
                });
            }
        }

        // 心跳
        //
        // 出错后下一帧既可以接着实际值递增，也可以接着出错前的序列递增，
        // 单个被破坏的心跳值和一次跳变都只报一次。
        let mut heartbeat = None;
        let mut expected_heartbeat = None;
        let mut last_heartbeat = previous.and_then(|prev| prev.last_heartbeat);
        let mut missed_heartbeat = None;
        if let Some(index) = profile.heartbeat_byte {
            match record.payload.get(index) {
                Some(&value) => {
                    heartbeat = Some(value);
                    if let Some(last) = last_heartbeat {
                        let expected = last.wrapping_add(1);
                        let resumed = previous
                            .and_then(|prev| prev.missed_heartbeat)
                            .map(|missed| missed.wrapping_add(1))
                            .filter(|&resume| resume == value);
                        expected_heartbeat = Some(resumed.unwrap_or(expected));
                        if value != expected && resumed.is_none() {
                            findings.push(ValidationFinding::HeartbeatMismatch {
                                identifier,
                                timestamp,
                                actual: value,
                                expected,
                            });
                            missed_heartbeat = Some(expected);
                        }
                    }
                    last_heartbeat = Some(value);
                }
                None => findings.push(ValidationFinding::ShortPayload {
                    identifier,
                    timestamp,
                    needed: index + 1,
                    actual: record.payload.len(),
                }),
            }
        }

        // 异或校验
        if profile.checksum {
            match record.payload.split_last() {
                Some((&stored, body)) => {
                    let computed = xor_checksum(body);
                    if computed != stored {
                        findings.push(ValidationFinding::ChecksumMismatch {
                            identifier,
                            timestamp,
                            computed,
                            stored,
                        });
                    }
                }
                None => findings.push(ValidationFinding::ShortPayload {
                    identifier,
                    timestamp,
                    needed: 1,
                    actual: 0,
                }),
            }
        }

        state.seen.insert(
            identifier,
            IdentifierState {
                last_timestamp: timestamp,
                last_heartbeat,
                missed_heartbeat,
            },
        );

        RecordCheck {
            status: RecordStatus {
                identifier,
                timestamp,
                time_diff,
                heartbeat,
                expected_heartbeat,
                ok: findings.is_empty(),
            },
            findings,
        }
    }

    /// 按输入顺序校验全部记录，单条出错不影响后续记录
    pub fn run<'r, I>(&self, records: I) -> ValidationReport
    where
        I: IntoIterator<Item = &'r RawFrameRecord>,
    {
        let mut state = ValidationState::new();
        let mut report = ValidationReport::default();

        for record in records {
            let check = self.step(&mut state, record);
            debug!("{}", check.status);
            report.statuses.push(check.status);
            report.findings.extend(check.findings);
        }

        info!(
            "validated {} record(s), {} finding(s)",
            report.statuses.len(),
            report.findings.len()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{ValidatorProfile, ESP_COMMAND, LIGHT_COMMAND};

    fn light_frame(timestamp: u64, heartbeat: u8) -> RawFrameRecord {
        RawFrameRecord::new(
            timestamp,
            LIGHT_COMMAND,
            "Extended",
            vec![0x01, 0, 0, 0, 0x09, 0, 0, heartbeat],
        )
    }

    fn esp_frame(timestamp: u64, heartbeat: u8) -> RawFrameRecord {
        let mut payload = vec![0x00, heartbeat, 0x00, 0x00, 0x27, 0x00, 0x00, 0x00];
        payload[7] = xor_checksum(&payload[..7]);
        RawFrameRecord::new(timestamp, ESP_COMMAND, "Extended", payload)
    }

    #[test]
    fn test_first_record_only_seeds_state() {
        let validator = RecordValidator::default();
        let mut state = ValidationState::new();

        assert!(!state.is_seen(LIGHT_COMMAND));
        let check = validator.step(&mut state, &light_frame(1000, 42));
        assert!(check.findings.is_empty());
        assert_eq!(check.status.time_diff, None);
        assert_eq!(check.status.heartbeat, Some(42));
        assert_eq!(check.status.expected_heartbeat, None);
        assert!(state.is_seen(LIGHT_COMMAND));
        assert_eq!(state.last_timestamp(LIGHT_COMMAND), Some(1000));
        assert_eq!(state.last_heartbeat(LIGHT_COMMAND), Some(42));
    }

    #[test]
    fn test_heartbeat_sequence() {
        let validator = RecordValidator::default();
        let records: Vec<_> = [5u8, 6, 7, 8]
            .iter()
            .enumerate()
            .map(|(i, hb)| light_frame(i as u64 * 50, *hb))
            .collect();
        assert!(validator.run(&records).is_clean());

        let records: Vec<_> = [5u8, 6, 9, 8]
            .iter()
            .enumerate()
            .map(|(i, hb)| light_frame(i as u64 * 50, *hb))
            .collect();
        let report = validator.run(&records);
        assert_eq!(
            report.findings,
            vec![ValidationFinding::HeartbeatMismatch {
                identifier: LIGHT_COMMAND,
                timestamp: 100,
                actual: 9,
                expected: 7,
            }]
        );
        // 第四帧接着出错前的序列，状态行显示实际匹配的期望值
        assert!(report.statuses[3].ok);
        assert_eq!(report.statuses[3].expected_heartbeat, Some(8));
    }

    #[test]
    fn test_heartbeat_jump_reported_once() {
        let validator = RecordValidator::default();
        let records: Vec<_> = [5u8, 6, 8, 9, 10]
            .iter()
            .enumerate()
            .map(|(i, hb)| light_frame(i as u64 * 50, *hb))
            .collect();
        let report = validator.run(&records);
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].timestamp(), 100);
    }

    #[test]
    fn test_repeated_heartbeat_reported_each_time() {
        let validator = RecordValidator::default();
        let records = vec![light_frame(0, 3), light_frame(50, 3), light_frame(100, 3)];
        let report = validator.run(&records);
        assert_eq!(report.findings.len(), 2);
    }

    #[test]
    fn test_heartbeat_wraparound() {
        let validator = RecordValidator::default();
        let records = vec![light_frame(0, 254), light_frame(50, 255), light_frame(100, 0)];
        assert!(validator.run(&records).is_clean());
    }

    #[test]
    fn test_period_tolerance() {
        let validator = RecordValidator::default();
        let records = vec![
            light_frame(0, 1),
            light_frame(51, 2),  // +1 容差内
            light_frame(100, 3), // 49 容差内
            light_frame(153, 4), // 53 超出
        ];
        let report = validator.run(&records);
        assert_eq!(
            report.findings,
            vec![ValidationFinding::PeriodMismatch {
                identifier: LIGHT_COMMAND,
                timestamp: 153,
                actual_ms: 53,
                expected_ms: 50,
            }]
        );
        assert!(!report.statuses[3].ok);
        assert_eq!(report.statuses[3].time_diff, Some(53));
    }

    #[test]
    fn test_checksum_rendering() {
        let validator = RecordValidator::default();
        let mut state = ValidationState::new();

        let good = esp_frame(0, 1);
        assert!(validator.step(&mut state, &good).findings.is_empty());

        let mut bad = esp_frame(20, 2);
        bad.payload[7] ^= 0xFF;
        let check = validator.step(&mut state, &bad);
        assert_eq!(check.findings.len(), 1);
        let message = check.findings[0].to_string();
        assert!(message.starts_with("XOR error: 1801B0A0 at 20ms"), "{message}");
    }

    #[test]
    fn test_short_payload_is_reported_not_panicking() {
        let validator = RecordValidator::default();
        let mut state = ValidationState::new();
        let record = RawFrameRecord::new(0, LIGHT_COMMAND, "Extended", vec![0x01, 0x02]);

        let check = validator.step(&mut state, &record);
        assert_eq!(
            check.findings,
            vec![ValidationFinding::ShortPayload {
                identifier: LIGHT_COMMAND,
                timestamp: 0,
                needed: 8,
                actual: 2,
            }]
        );
        assert_eq!(check.status.heartbeat, None);
    }

    #[test]
    fn test_unprofiled_identifier_tracks_time_only() {
        let validator = RecordValidator::new(ProfileTable::new());
        let mut state = ValidationState::new();

        validator.step(&mut state, &RawFrameRecord::new(10, 0x321, "Standard", vec![1]));
        let check = validator.step(&mut state, &RawFrameRecord::new(35, 0x321, "Standard", vec![7]));
        assert!(check.status.ok);
        assert_eq!(check.status.time_diff, Some(25));
        assert_eq!(check.status.heartbeat, None);
    }

    #[test]
    fn test_identifiers_are_independent() {
        let mut profiles = ProfileTable::new();
        profiles.insert(0x10, ValidatorProfile::new(Some(10), Some(0), false));
        profiles.insert(0x20, ValidatorProfile::new(Some(10), Some(0), false));
        let validator = RecordValidator::new(profiles);

        let records = vec![
            RawFrameRecord::new(0, 0x10, "Standard", vec![1]),
            RawFrameRecord::new(5, 0x20, "Standard", vec![100]),
            RawFrameRecord::new(10, 0x10, "Standard", vec![2]),
            RawFrameRecord::new(15, 0x20, "Standard", vec![101]),
        ];
        assert!(validator.run(&records).is_clean());
    }

    #[test]
    fn test_extreme_timestamps_do_not_overflow() {
        let validator = RecordValidator::default();
        let records = vec![
            light_frame(1 << 63, 1),
            light_frame(0, 2),
            light_frame(u64::MAX, 3),
        ];
        let report = validator.run(&records);

        let intervals: Vec<Option<i64>> = report.statuses.iter().map(|s| s.time_diff).collect();
        assert_eq!(intervals, vec![None, Some(i64::MIN), Some(i64::MAX)]);
        assert_eq!(report.findings.len(), 2);
        assert_eq!(
            report.findings[0],
            ValidationFinding::PeriodMismatch {
                identifier: LIGHT_COMMAND,
                timestamp: 0,
                actual_ms: i64::MIN,
                expected_ms: 50,
            }
        );
        assert!(matches!(
            report.findings[1],
            ValidationFinding::PeriodMismatch { actual_ms: i64::MAX, .. }
        ));
    }

    #[test]
    fn test_status_line_columns() {
        let status = RecordStatus {
            identifier: 0x1805B0A0,
            timestamp: 50,
            time_diff: Some(50),
            heartbeat: Some(6),
            expected_heartbeat: Some(6),
            ok: true,
        };
        assert_eq!(
            status.to_string(),
            "1805B0A0     50           6            6            OK          "
        );

        let first = RecordStatus {
            time_diff: None,
            heartbeat: None,
            expected_heartbeat: None,
            ok: false,
            ..status
        };
        assert_eq!(
            first.to_string(),
            "1805B0A0     -            -            -            ERR         "
        );
    }
}
