//! 校验配置加载
//!
//! ```yaml
//! 0x1801B0A0: {period_ms: 20, heartbeat_byte: 1, checksum: true}
//! 0x1805B0A0: {period_ms: 50, heartbeat_byte: 7}
//! ```

use canlog_verify::{ProfileTable, ValidatorProfile};
use std::path::Path;
use tracing::info;

use crate::error::IngestError;
use crate::schema_loader::{extension_of, FrameId, IdEntries};

type ProfileFile = IdEntries<ValidatorProfile>;

pub struct ProfileLoader;

impl ProfileLoader {
    pub fn from_yaml_str(text: &str) -> Result<ProfileTable, IngestError> {
        let file: ProfileFile = serde_yaml::from_str(text)?;
        Self::build(file)
    }

    pub fn from_json_str(text: &str) -> Result<ProfileTable, IngestError> {
        let file: ProfileFile = serde_json::from_str(text)?;
        Self::build(file)
    }

    pub fn load(path: &Path) -> Result<ProfileTable, IngestError> {
        let parse: fn(&str) -> Result<ProfileTable, IngestError> =
            match extension_of(path).as_deref() {
                Some("yaml") | Some("yml") => Self::from_yaml_str,
                Some("json") => Self::from_json_str,
                _ => {
                    return Err(IngestError::UnsupportedFormat(format!(
                        "profile file {}",
                        path.display()
                    )))
                }
            };
        let profiles = parse(&std::fs::read_to_string(path)?)?;
        info!(
            "loaded {} validator profile(s) from {}",
            profiles.len(),
            path.display()
        );
        Ok(profiles)
    }

    fn build(file: ProfileFile) -> Result<ProfileTable, IngestError> {
        let mut table = ProfileTable::new();
        for (FrameId(identifier), profile) in file.0 {
            if table.insert(identifier, profile).is_some() {
                return Err(IngestError::DuplicateIdentifier(identifier));
            }
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_profiles() {
        let yaml = "0x1801B0A0: {period_ms: 20, heartbeat_byte: 1, checksum: true}\n\
                    0x1805B0A0: {period_ms: 50, heartbeat_byte: 7}\n\
                    0x123: {checksum: true}\n";
        let table = ProfileLoader::from_yaml_str(yaml).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(
            table.get(0x1801B0A0),
            Some(&ValidatorProfile::new(Some(20), Some(1), true))
        );
        assert_eq!(
            table.get(0x1805B0A0),
            Some(&ValidatorProfile::new(Some(50), Some(7), false))
        );
        assert_eq!(table.get(0x123), Some(&ValidatorProfile::new(None, None, true)));
    }

    #[test]
    fn test_json_profiles() {
        let json = r#"{"0x1807B0A0": {"period_ms": 100, "heartbeat_byte": 7}}"#;
        let table = ProfileLoader::from_json_str(json).unwrap();
        assert_eq!(
            table.get(0x1807B0A0),
            Some(&ValidatorProfile::new(Some(100), Some(7), false))
        );
    }

    #[test]
    fn test_identifier_defined_twice() {
        let yaml = "0x1801B0A0: {period_ms: 20}\n402763936: {period_ms: 50}\n";
        assert!(matches!(
            ProfileLoader::from_yaml_str(yaml),
            Err(IngestError::DuplicateIdentifier(0x1801B0A0))
        ));

        let json = r#"{"0x10": {"checksum": true}, "16": {"checksum": false}}"#;
        assert!(matches!(
            ProfileLoader::from_json_str(json),
            Err(IngestError::DuplicateIdentifier(0x10))
        ));
    }

    #[test]
    fn test_bad_identifier() {
        assert!(ProfileLoader::from_yaml_str("nope: {checksum: true}\n").is_err());
        assert!(matches!(
            ProfileLoader::load(Path::new("profiles.ini")),
            Err(IngestError::UnsupportedFormat(_))
        ));
    }
}
