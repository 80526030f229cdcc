//! WiFi link and scan data models

use serde::{Deserialize, Serialize};
use std::fmt;

/// RSSI range considered physically meaningful, in dBm
pub const RELIABLE_RSSI_RANGE: std::ops::RangeInclusive<i32> = -100..=0;

/// Frequency band of a WiFi channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WifiBand {
    #[serde(rename = "2.4GHz")]
    Band2_4GHz,
    #[serde(rename = "5GHz")]
    Band5GHz,
    #[serde(rename = "6GHz")]
    Band6GHz,
}

impl WifiBand {
    /// Derive the band from a channel number
    pub fn from_channel(channel: u32) -> Option<Self> {
        match channel {
            0 => None,
            1..=14 => Some(Self::Band2_4GHz),
            15..=177 => Some(Self::Band5GHz),
            _ => Some(Self::Band6GHz),
        }
    }

    /// Parse labels such as `2.4GHz`, `5 GHz` or `6`
    pub fn from_label(label: &str) -> Option<Self> {
        let cleaned: String = label
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        match cleaned.as_str() {
            "2.4" | "2" => Some(Self::Band2_4GHz),
            "5" => Some(Self::Band5GHz),
            "6" => Some(Self::Band6GHz),
            _ => None,
        }
    }
}

impl fmt::Display for WifiBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Band2_4GHz => write!(f, "2.4GHz"),
            Self::Band5GHz => write!(f, "5GHz"),
            Self::Band6GHz => write!(f, "6GHz"),
        }
    }
}

/// Signal quality label derived from RSSI
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalQuality {
    VeryWeak,
    Weak,
    Fair,
    Good,
    Excellent,
}

impl SignalQuality {
    pub fn from_rssi(rssi: i32) -> Self {
        if rssi >= -50 {
            Self::Excellent
        } else if rssi >= -60 {
            Self::Good
        } else if rssi >= -70 {
            Self::Fair
        } else if rssi >= -80 {
            Self::Weak
        } else {
            Self::VeryWeak
        }
    }
}

impl fmt::Display for SignalQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::VeryWeak => "very weak",
            Self::Weak => "weak",
            Self::Fair => "fair",
            Self::Good => "good",
            Self::Excellent => "excellent",
        };
        write!(f, "{}", label)
    }
}

/// One network seen in a WiFi scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanEntry {
    pub ssid: String,
    pub bssid: Option<String>,
    pub rssi: Option<i32>,
    pub channel: Option<u32>,
    pub security: Option<String>,
}

/// Current WiFi association
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiInfo {
    pub ssid: Option<String>,
    pub bssid: Option<String>,
    pub rssi: Option<i32>,
    pub noise: Option<i32>,
    pub channel: Option<u32>,
    /// Explicit band when the tool reports one; otherwise see [`WifiInfo::band`]
    pub reported_band: Option<WifiBand>,
    pub channel_width_mhz: Option<u32>,
    pub phy_mode: Option<String>,
    pub tx_rate_mbps: Option<u32>,
    pub mcs_index: Option<u32>,
    pub security: Option<String>,
    #[serde(default)]
    pub nearby_networks: Vec<ScanEntry>,
}

impl WifiInfo {
    /// Signal-to-noise ratio in dB; present only when both inputs are and
    /// the difference fits
    pub fn snr(&self) -> Option<i32> {
        self.rssi?.checked_sub(self.noise?)
    }

    /// Band as reported, or derived from the channel number
    pub fn band(&self) -> Option<WifiBand> {
        self.reported_band
            .or_else(|| self.channel.and_then(WifiBand::from_channel))
    }

    /// Whether the RSSI lies in the physically meaningful range
    pub fn rssi_is_reliable(&self) -> Option<bool> {
        self.rssi.map(|rssi| RELIABLE_RSSI_RANGE.contains(&rssi))
    }

    pub fn signal_quality(&self) -> Option<SignalQuality> {
        self.rssi.map(SignalQuality::from_rssi)
    }

    /// Nearby networks sharing the current channel, excluding our own BSSID
    pub fn co_channel_networks(&self) -> usize {
        let Some(channel) = self.channel else {
            return 0;
        };
        self.nearby_networks
            .iter()
            .filter(|network| network.channel == Some(channel))
            .filter(|network| match (&network.bssid, &self.bssid) {
                (Some(theirs), Some(ours)) => !theirs.eq_ignore_ascii_case(ours),
                _ => true,
            })
            .count()
    }

    /// True when nothing at all was extracted
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
