//! Device and platform metrics
//!
//! The host application reads these once from its platform layer at startup
//! and hands them to [`crate::AgentCell::initialize`]. The agent never
//! re-samples them; screen size, locale and friends are baked into the root
//! beacon prefix for the process lifetime.

use crate::error::{Error, Result};

/// Platform metrics for the device the host application runs on.
#[derive(Debug, Clone)]
pub struct DeviceProfile {
    /// Screen width in pixels
    pub screen_width: u32,
    /// Screen height in pixels
    pub screen_height: u32,
    /// Color depth in bits
    pub color_depth: u32,
    /// Locale tag, e.g. "en-US"
    pub locale: String,
    /// Hostname reported in beacons (`utmhn`)
    pub hostname: String,
    /// Platform identifier, e.g. the device model string
    pub platform: String,
    /// Platform profile string
    pub profile: String,
    /// Platform configuration string
    pub configuration: String,
    /// Character encoding advertised in beacons (`utmcs`), e.g. "UTF-8"
    pub encoding: String,
}

impl DeviceProfile {
    /// Check the metrics the beacon format cannot do without.
    ///
    /// A zero screen dimension or an empty platform/locale string means the
    /// host failed to read its platform layer; that is a wiring bug and
    /// fails initialization.
    pub fn validate(&self) -> Result<()> {
        if self.screen_width == 0 || self.screen_height == 0 {
            return Err(Error::Config(
                "screen dimensions are required".to_string(),
            ));
        }
        if self.platform.is_empty() {
            return Err(Error::Config(
                "platform identifier is required".to_string(),
            ));
        }
        if self.locale.is_empty() {
            return Err(Error::Config("locale is required".to_string()));
        }
        Ok(())
    }

    /// Synthesize the User-Agent header sent with every beacon.
    pub fn user_agent(&self) -> String {
        format!(
            "{} (Profile/{} Configuration/{}; {})",
            self.platform, self.profile, self.configuration, self.locale
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> DeviceProfile {
        DeviceProfile {
            screen_width: 240,
            screen_height: 320,
            color_depth: 16,
            locale: "en-US".to_string(),
            hostname: "device.local".to_string(),
            platform: "Nokia6120c".to_string(),
            profile: "MIDP-2.0".to_string(),
            configuration: "CLDC-1.1".to_string(),
            encoding: "UTF-8".to_string(),
        }
    }

    #[test]
    fn test_user_agent_shape() {
        assert_eq!(
            profile().user_agent(),
            "Nokia6120c (Profile/MIDP-2.0 Configuration/CLDC-1.1; en-US)"
        );
    }

    #[test]
    fn test_validate_accepts_complete_profile() {
        assert!(profile().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_screen() {
        let mut p = profile();
        p.screen_width = 0;
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_missing_platform() {
        let mut p = profile();
        p.platform = String::new();
        assert!(p.validate().is_err());
    }
}
