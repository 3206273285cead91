use anyhow::bail;
use bindicator::app::supervisor::ConnectionState;
use bindicator::app::App;
use bindicator::config::Config;
use bindicator::hal::wifi::WifiConfig;
use esp_idf_sys as _;

use bindicator_esp_idf::platform::{self, BoardType, PlatformImpl};

fn main() -> anyhow::Result<()> {
    esp_idf_sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    let config = Config::from_env_vars();
    let wifi = WifiConfig::from_env_var().unwrap_or_default();

    let platform_config = platform::Config {
        #[cfg(feature = "m5stampc3")]
        board_type: BoardType::M5StampC3,
        #[cfg(feature = "rustdevkit")]
        board_type: BoardType::RustDevKit,
        strip_len: config.strip_len,
    };

    log::info!("Create platform");
    let p = PlatformImpl::new(&platform_config)?;

    log::info!("Create app");
    let mut app = App::new(&p, &config);

    if app.start(&wifi) != ConnectionState::Connected {
        bail!("No Wi-Fi connection");
    }

    app.run()
}
