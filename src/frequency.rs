//! Frequency-overlap detection for the node's wireless devices.

use serde::Serialize;
use serde_json::Value;

use crate::models::Wireless;

/// Lower edge of the regulatory sub-band boundary, in MHz.
pub const DEFAULT_OVERLAP_LOW_MHZ: f64 = 5490.0;
/// Upper edge of the regulatory sub-band boundary, in MHz.
pub const DEFAULT_OVERLAP_HIGH_MHZ: f64 = 5710.0;

/// A device's occupied spectrum straddles the boundary when its band starts
/// below `low_mhz` and ends above `high_mhz`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OverlapThresholds {
    pub low_mhz: f64,
    pub high_mhz: f64,
}

impl Default for OverlapThresholds {
    fn default() -> Self {
        Self {
            low_mhz: DEFAULT_OVERLAP_LOW_MHZ,
            high_mhz: DEFAULT_OVERLAP_HIGH_MHZ,
        }
    }
}

/// Normalised radio settings of one device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RadioRecord {
    pub frequency_mhz: Option<i64>,
    pub channel_width_mhz: Option<i64>,
    pub mode: Option<String>,
}

impl RadioRecord {
    pub fn from_wireless(wireless: &Wireless) -> Self {
        Self {
            frequency_mhz: wireless.frequency.as_ref().and_then(parse_mhz),
            channel_width_mhz: wireless.chanbw.as_ref().and_then(parse_mhz),
            mode: wireless.mode.clone(),
        }
    }

    /// Occupied band `[center - width/2, center + width/2]`, or `None` when
    /// either value is missing or zero.
    pub fn band(&self) -> Option<(f64, f64)> {
        let center = self.frequency_mhz.filter(|f| *f != 0)? as f64;
        let half = self.channel_width_mhz.filter(|w| *w != 0)? as f64 / 2.0;
        Some((center - half, center + half))
    }

    /// Cell text for the devices table, e.g. `5500 MHz ap`.
    pub fn summary(&self) -> String {
        let frequency = self
            .frequency_mhz
            .map(|f| format!("{} MHz", f))
            .unwrap_or_default();
        let mode = self.mode.as_deref().unwrap_or_default();
        format!("{} {}", frequency, mode).trim().to_string()
    }
}

/// Reads a MHz figure from `5500`, `"5500"`, `"5500 MHz"` or `"5500MHz"`.
/// Anything after the leading integer is ignored.
pub fn parse_mhz(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            let digits_end = s
                .char_indices()
                .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && c == '-')))
                .map_or(s.len(), |(i, _)| i);
            s[..digits_end].parse().ok()
        }
        _ => None,
    }
}

/// `true` if any radio's band straddles the threshold pair.
///
/// Radios without a usable frequency or width never raise the warning.
pub fn overlap_warning<'a>(
    radios: impl IntoIterator<Item = &'a RadioRecord>,
    thresholds: OverlapThresholds,
) -> bool {
    radios
        .into_iter()
        .filter_map(RadioRecord::band)
        .any(|(low, high)| low < thresholds.low_mhz && high > thresholds.high_mhz)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn radio(frequency: i64, width: i64) -> RadioRecord {
        RadioRecord {
            frequency_mhz: Some(frequency),
            channel_width_mhz: Some(width),
            mode: None,
        }
    }

    #[test]
    fn test_parse_mhz_variants() {
        assert_eq!(parse_mhz(&json!(5500)), Some(5500));
        assert_eq!(parse_mhz(&json!("5500")), Some(5500));
        assert_eq!(parse_mhz(&json!(" 5500 MHz")), Some(5500));
        assert_eq!(parse_mhz(&json!("5500MHz")), Some(5500));
        assert_eq!(parse_mhz(&json!(20.0)), Some(20));
        assert_eq!(parse_mhz(&json!("n/a")), None);
        assert_eq!(parse_mhz(&json!(null)), None);
    }

    #[test]
    fn test_wide_channel_across_boundary_warns() {
        // 5600 +/- 120 covers 5480..5720
        assert!(overlap_warning(&[radio(5600, 240)], OverlapThresholds::default()));
    }

    #[test]
    fn test_channel_inside_boundary_does_not_warn() {
        // 5600 +/- 40 covers 5560..5640
        assert!(!overlap_warning(&[radio(5600, 80)], OverlapThresholds::default()));
    }

    #[test]
    fn test_band_touching_threshold_does_not_warn() {
        // 5600 +/- 110 covers exactly 5490..5710
        assert!(!overlap_warning(&[radio(5600, 220)], OverlapThresholds::default()));
    }

    #[test]
    fn test_missing_values_do_not_warn() {
        let radios = [
            RadioRecord {
                frequency_mhz: None,
                channel_width_mhz: Some(240),
                mode: None,
            },
            radio(5600, 0),
        ];
        assert!(!overlap_warning(&radios, OverlapThresholds::default()));
    }

    #[test]
    fn test_thresholds_are_configurable() {
        let thresholds = OverlapThresholds {
            low_mhz: 5580.0,
            high_mhz: 5620.0,
        };
        assert!(overlap_warning(&[radio(5600, 80)], thresholds));
    }

    #[test]
    fn test_summary() {
        let mut record = radio(5500, 20);
        record.mode = Some("sta".to_string());
        assert_eq!(record.summary(), "5500 MHz sta");
        record.frequency_mhz = None;
        assert_eq!(record.summary(), "sta");
    }
}
