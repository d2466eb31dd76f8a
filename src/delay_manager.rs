use std::time::Duration;
use std::thread;
use log::{debug, info};

/// Fixed pause after each detail page so the site is not hammered.
pub fn politeness_delay(delay: Duration) {
    if delay.is_zero() {
        return;
    }
    debug!("Waiting for {} ms (Politeness Delay)...", delay.as_millis());
    thread::sleep(delay);
}

pub fn retry_delay(delay: Duration) {
    if delay.is_zero() {
        return;
    }
    info!("Waiting for {} ms before retrying...", delay.as_millis());
    thread::sleep(delay);
}
