use std::cell::RefCell;
use std::time::{Duration, Instant};

use anyhow::bail;
use bindicator::svc::TimeSync;
use esp_idf_svc::sntp::{EspSntp, SyncStatus};

const SYNC_TIMEOUT: Duration = Duration::from_secs(30);
const POLL_PERIOD: Duration = Duration::from_millis(100);

/// Keeps the SNTP service running after the first sync so the clock stays
/// corrected.
#[derive(Default)]
pub struct EspTimeSync {
    sntp: RefCell<Option<EspSntp>>,
}

impl TimeSync for EspTimeSync {
    fn sync(&self) -> anyhow::Result<()> {
        let mut slot = self.sntp.try_borrow_mut()?;
        let sntp = match slot.take() {
            Some(sntp) => sntp,
            None => EspSntp::new_default()?,
        };

        let result = wait_for_completion(&sntp);
        *slot = Some(sntp);
        result
    }
}

fn wait_for_completion(sntp: &EspSntp) -> anyhow::Result<()> {
    let deadline = Instant::now() + SYNC_TIMEOUT;
    while sntp.get_sync_status() != SyncStatus::Completed {
        if Instant::now() >= deadline {
            bail!("SNTP not completed after {}s", SYNC_TIMEOUT.as_secs());
        }
        std::thread::sleep(POLL_PERIOD);
    }
    Ok(())
}
