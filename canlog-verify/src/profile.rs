//! 校验配置表
//!
//! 每个标识符的发送周期、心跳字节位置、是否带异或校验

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 网关控制帧
pub const ESP_COMMAND: u32 = 0x1801B0A0;
pub const SPEED_COMMAND: u32 = 0x1803B0A0;
pub const LIGHT_COMMAND: u32 = 0x1805B0A0;
pub const REMOTE_COMMAND: u32 = 0x1807B0A0;

/// 单个标识符的校验配置
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorProfile {
    /// 期望周期（毫秒）
    #[serde(default)]
    pub period_ms: Option<u64>,
    /// 心跳所在字节下标
    #[serde(default)]
    pub heartbeat_byte: Option<usize>,
    /// 最后一个字节是否为前面所有字节的异或
    #[serde(default)]
    pub checksum: bool,
}

impl ValidatorProfile {
    pub fn new(period_ms: Option<u64>, heartbeat_byte: Option<usize>, checksum: bool) -> Self {
        Self {
            period_ms,
            heartbeat_byte,
            checksum,
        }
    }
}

/// 标识符 → 校验配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileTable {
    profiles: BTreeMap<u32, ValidatorProfile>,
}

impl ProfileTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 网关四个控制帧的默认配置
    pub fn gateway_defaults() -> Self {
        let mut table = Self::new();
        table.insert(ESP_COMMAND, ValidatorProfile::new(Some(20), Some(1), true));
        table.insert(SPEED_COMMAND, ValidatorProfile::new(Some(20), Some(2), true));
        table.insert(LIGHT_COMMAND, ValidatorProfile::new(Some(50), Some(7), false));
        table.insert(REMOTE_COMMAND, ValidatorProfile::new(Some(100), Some(7), false));
        table
    }

    pub fn insert(&mut self, identifier: u32, profile: ValidatorProfile) -> Option<ValidatorProfile> {
        self.profiles.insert(identifier, profile)
    }

    pub fn get(&self, identifier: u32) -> Option<&ValidatorProfile> {
        self.profiles.get(&identifier)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &ValidatorProfile)> {
        self.profiles.iter().map(|(id, p)| (*id, p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_defaults() {
        let table = ProfileTable::gateway_defaults();
        assert_eq!(table.len(), 4);

        let esp = table.get(ESP_COMMAND).unwrap();
        assert_eq!(esp.period_ms, Some(20));
        assert_eq!(esp.heartbeat_byte, Some(1));
        assert!(esp.checksum);

        let remote = table.get(REMOTE_COMMAND).unwrap();
        assert_eq!(remote.period_ms, Some(100));
        assert_eq!(remote.heartbeat_byte, Some(7));
        assert!(!remote.checksum);

        assert!(table.get(0x123).is_none());
    }
}
