//! 帧记录校验集成测试
//!
//! 模拟网关发送日志，验证周期、心跳、异或三类检查的组合行为

use canlog_core::utils::xor_checksum;
use canlog_core::RawFrameRecord;
use canlog_verify::profile::{ESP_COMMAND, LIGHT_COMMAND, SPEED_COMMAND};
use canlog_verify::{
    ProfileTable, RecordValidator, ReportGenerator, ValidationFinding, ValidatorProfile,
};

/// 以50ms间隔生成带心跳的帧，心跳位于字节0
fn heartbeat_records(identifier: u32, heartbeats: &[u8]) -> Vec<RawFrameRecord> {
    heartbeats
        .iter()
        .enumerate()
        .map(|(i, &hb)| RawFrameRecord::new(i as u64 * 50, identifier, "Standard", vec![hb, 0x00]))
        .collect()
}

fn heartbeat_validator(identifier: u32) -> RecordValidator {
    let mut profiles = ProfileTable::new();
    profiles.insert(identifier, ValidatorProfile::new(Some(50), Some(0), false));
    RecordValidator::new(profiles)
}

/// 生成一帧ESP控制帧，最后一个字节为异或校验
fn esp_frame(timestamp: u64, heartbeat: u8) -> RawFrameRecord {
    let mut data = vec![0x00, heartbeat, 0x00, 0x00, 0x27, 0x00, 0x00, 0x00];
    data[7] = xor_checksum(&data[..7]);
    RawFrameRecord::new(timestamp, ESP_COMMAND, "Extended", data)
}

#[test]
fn test_heartbeat_increment_clean() {
    let validator = heartbeat_validator(0x200);
    let report = validator.run(&heartbeat_records(0x200, &[5, 6, 7, 8]));
    assert!(report.is_clean(), "{:?}", report.error_messages());
    assert_eq!(report.statuses.len(), 4);
}

#[test]
fn test_single_corrupted_heartbeat() {
    let validator = heartbeat_validator(0x200);
    let report = validator.run(&heartbeat_records(0x200, &[5, 6, 9, 8]));

    assert_eq!(report.findings.len(), 1);
    assert_eq!(
        report.findings[0],
        ValidationFinding::HeartbeatMismatch {
            identifier: 0x200,
            timestamp: 100,
            actual: 9,
            expected: 7,
        }
    );
    let flags: Vec<bool> = report.statuses.iter().map(|s| s.ok).collect();
    assert_eq!(flags, vec![true, true, false, true]);
}

#[test]
fn test_checksum_example() {
    let mut profiles = ProfileTable::new();
    profiles.insert(0x300, ValidatorProfile::new(None, None, true));
    let validator = RecordValidator::new(profiles);

    // 0x10 ^ 0x7F ^ 0x7F = 0x10
    let valid = RawFrameRecord::new(0, 0x300, "Standard", vec![0x10, 0x7F, 0x7F, 0x10]);
    assert!(validator.run([&valid]).is_clean());

    let corrupted = RawFrameRecord::new(0, 0x300, "Standard", vec![0x10, 0x7F, 0x7F, 0x9C]);
    let report = validator.run([&corrupted]);
    assert_eq!(
        report.error_messages(),
        vec!["XOR error: 300 at 0ms, computed 10, stored 9C".to_string()]
    );
}

#[test]
fn test_mixed_gateway_trace() {
    let validator = RecordValidator::default();

    let mut records = Vec::new();
    for i in 0..5u8 {
        records.push(esp_frame(i as u64 * 20, i));
    }
    // 第四帧晚到6ms
    records[3].timestamp += 6;
    // 未配置的标识符不会产生任何问题
    records.push(RawFrameRecord::new(30, 0x123, "Standard", vec![0xAA]));
    records.push(RawFrameRecord::new(45, 0x123, "Standard", vec![0xBB]));
    // 速度帧缺失心跳字节（两字节负载的异或恰好正确）
    records.push(RawFrameRecord::new(50, SPEED_COMMAND, "Extended", vec![0x80, 0x80]));

    let report = validator.run(&records);
    let messages = report.error_messages();

    // 40→66 超出容差，66→80 也超出
    assert_eq!(messages.len(), 3, "{messages:?}");
    assert_eq!(messages[0], "Period error: 1801B0A0 at 66ms, actual interval 26ms, expected 20ms");
    assert_eq!(messages[1], "Period error: 1801B0A0 at 80ms, actual interval 14ms, expected 20ms");
    assert!(messages[2].starts_with("Short payload: 1803B0A0 at 50ms"));

    let text = ReportGenerator::default().generate_report(&report);
    assert!(text.contains("Found 3 issue(s)"));
}

#[test]
fn test_light_frame_period_and_heartbeat_defaults() {
    let validator = RecordValidator::default();
    let records: Vec<_> = (0..4u8)
        .map(|i| {
            RawFrameRecord::new(
                1_000 + i as u64 * 50,
                LIGHT_COMMAND,
                "Extended",
                vec![0x01, 0, 0, 0, 0x09, 0, 0, 200 + i],
            )
        })
        .collect();
    assert!(validator.run(&records).is_clean());
}
