//! Job and page settings containers.
//!
//! Settings are plain key/value maps filled through typed setters. The packer takes a snapshot
//! when a job or a page is opened, so a container can be reused for the next job or page.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Write};

pub const JOB_NAME: &str = "jobName";
pub const JOB_COPIES: &str = "jobCopies";
pub const JOB_COLLATE: &str = "jobCollate";
pub const USER_NAME: &str = "userName";
pub const ACCOUNT_ID: &str = "accountId";
pub const APPLICATION_NAME: &str = "applicationName";
pub const APPLICATION_VERSION: &str = "applicationVersion";
pub const APPLICATION_UUID: &str = "applicationUuid";
pub const JOB_UUID: &str = "jobUuid";

pub const COPIES: &str = "copies";
pub const MEDIA_ID: &str = "mediaId";
pub const MEDIA_SOURCE: &str = "mediaSource";
pub const PRINT_QUALITY: &str = "printQuality";
pub const COLOR_MODE: &str = "colorMode";
pub const TOP_MARGIN: &str = "topMargin";
pub const BOTTOM_MARGIN: &str = "bottomMargin";
pub const LEFT_MARGIN: &str = "leftMargin";
pub const RIGHT_MARGIN: &str = "rightMargin";
const SELECTOR_PREFIX: &str = "selector.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Boolean(bool),
    Integer(i64),
    Text(String),
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Boolean(b) => write!(f, "{}", b),
            SettingValue::Integer(i) => write!(f, "{}", i),
            SettingValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        SettingValue::Boolean(value)
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        SettingValue::Integer(value)
    }
}

impl From<u32> for SettingValue {
    fn from(value: u32) -> Self {
        SettingValue::Integer(value as i64)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::Text(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        SettingValue::Text(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings {
    values: BTreeMap<String, SettingValue>,
}

impl Settings {
    pub fn set(&mut self, key: &str, value: impl Into<SettingValue>) -> &mut Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SettingValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Readable `key=value` lines, sorted by key.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.values {
            // writing into a String cannot fail
            let _ = writeln!(out, "{}={}", key, value);
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrintQuality {
    Fast,
    Normal,
    Best,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorMode {
    Color,
    Grayscale,
    Monochrome,
}

/// Whether `value` can be quoted in a PJL command: no `"` and no control characters.
pub fn is_pjl_safe(value: &str) -> bool {
    !value.chars().any(|c| c == '"' || c.is_control())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobSettings {
    settings: Settings,
}

impl JobSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_job_name(&mut self, value: &str) -> &mut Self {
        self.settings.set(JOB_NAME, value);
        self
    }

    pub fn set_job_copies(&mut self, value: u32) -> &mut Self {
        self.settings.set(JOB_COPIES, value);
        self
    }

    pub fn set_job_collate(&mut self, value: bool) -> &mut Self {
        self.settings.set(JOB_COLLATE, value);
        self
    }

    pub fn set_user_name(&mut self, value: &str) -> &mut Self {
        self.settings.set(USER_NAME, value);
        self
    }

    pub fn set_account_id(&mut self, value: &str) -> &mut Self {
        self.settings.set(ACCOUNT_ID, value);
        self
    }

    pub fn set_application_name(&mut self, value: &str) -> &mut Self {
        self.settings.set(APPLICATION_NAME, value);
        self
    }

    pub fn set_application_version(&mut self, value: &str) -> &mut Self {
        self.settings.set(APPLICATION_VERSION, value);
        self
    }

    pub fn set_application_uuid(&mut self, value: &str) -> &mut Self {
        self.settings.set(APPLICATION_UUID, value);
        self
    }

    pub fn set_job_uuid(&mut self, value: &str) -> &mut Self {
        self.settings.set(JOB_UUID, value);
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<SettingValue>) -> &mut Self {
        self.settings.set(key, value);
        self
    }

    pub fn job_name(&self) -> Option<String> {
        self.settings.get(JOB_NAME).map(|value| value.to_string())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn dump(&self) -> String {
        self.settings.dump()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageSettings {
    settings: Settings,
}

impl PageSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Programs a print mode selector, as listed by the printer's supported print modes.
    pub fn set_selector(&mut self, key: &str, value: &str) -> &mut Self {
        self.settings.set(&format!("{}{}", SELECTOR_PREFIX, key), value);
        self
    }

    pub fn selector(&self, key: &str) -> Option<&SettingValue> {
        self.settings.get(&format!("{}{}", SELECTOR_PREFIX, key))
    }

    pub fn set_copies(&mut self, value: u32) -> &mut Self {
        self.settings.set(COPIES, value);
        self
    }

    pub fn set_media_id(&mut self, value: &str) -> &mut Self {
        self.settings.set(MEDIA_ID, value);
        self
    }

    pub fn set_media_source(&mut self, value: &str) -> &mut Self {
        self.settings.set(MEDIA_SOURCE, value);
        self
    }

    pub fn set_print_quality(&mut self, value: PrintQuality) -> &mut Self {
        self.settings.set(PRINT_QUALITY, format!("{:?}", value));
        self
    }

    pub fn set_color_mode(&mut self, value: ColorMode) -> &mut Self {
        self.settings.set(COLOR_MODE, format!("{:?}", value));
        self
    }

    /// Margins in micrometers.
    pub fn set_margins(&mut self, top: u32, bottom: u32, left: u32, right: u32) -> &mut Self {
        self.settings
            .set(TOP_MARGIN, top)
            .set(BOTTOM_MARGIN, bottom)
            .set(LEFT_MARGIN, left)
            .set(RIGHT_MARGIN, right);
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<SettingValue>) -> &mut Self {
        self.settings.set(key, value);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn dump(&self) -> String {
        self.settings.dump()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dump_is_sorted() {
        let mut settings = JobSettings::new();
        settings
            .set_user_name("alice")
            .set_job_name("poster")
            .set_job_copies(2)
            .set_job_collate(true);
        assert_eq!(
            settings.dump(),
            "jobCollate=true\njobCopies=2\njobName=poster\nuserName=alice\n"
        );
    }

    #[test]
    fn test_page_selectors() {
        let mut page = PageSettings::new();
        page.set_selector("mediaType", "glossy")
            .set_print_quality(PrintQuality::Best)
            .set_margins(5000, 5000, 3000, 3000);
        assert_eq!(
            page.selector("mediaType"),
            Some(&SettingValue::Text("glossy".to_string()))
        );
        assert!(page.settings().contains(PRINT_QUALITY));
        assert_eq!(
            page.settings().get(LEFT_MARGIN),
            Some(&SettingValue::Integer(3000))
        );
    }

    #[test]
    fn test_json_snapshot() {
        let page: PageSettings =
            serde_json::from_str(r#"{"copies": 3, "mediaId": "roll-1", "duplex": false}"#)
                .unwrap();
        assert_eq!(page.settings().get(COPIES), Some(&SettingValue::Integer(3)));
        assert_eq!(
            page.settings().get("duplex"),
            Some(&SettingValue::Boolean(false))
        );
    }
}
