pub trait Wifi {
    /// Configures the station and starts associating. Returns as soon as the
    /// attempt is underway; an error here is a definitive failure.
    fn setup(&self, config: &WifiConfig) -> anyhow::Result<()>;

    fn is_connected(&self) -> bool;
}

#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub struct WifiConfig<'a> {
    pub ssid: &'a str,
    pub password: &'a str,
}

impl<'a> WifiConfig<'a> {
    /// Parses `ssid:password`. The password may itself contain colons.
    fn try_from_str(s: &'a str) -> Option<Self> {
        let (ssid, password) = s.split_once(':')?;
        if ssid.is_empty() {
            return None;
        }
        Some(WifiConfig { ssid, password })
    }
}

impl WifiConfig<'static> {
    pub fn from_env_var() -> Option<Self> {
        option_env!("BINDICATOR_WIFI_CONFIG").and_then(WifiConfig::try_from_str)
    }
}

impl Default for WifiConfig<'_> {
    fn default() -> Self {
        WifiConfig {
            ssid: "bindicator",
            password: "",
        }
    }
}
