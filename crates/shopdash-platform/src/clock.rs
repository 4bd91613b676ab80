//! Wall clock and timers backed by the browser.

use async_trait::async_trait;
use chrono::NaiveDate;
use gloo_timers::future::TimeoutFuture;
use shopdash_core::ports::ClockPort;

#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserClock;

impl BrowserClock {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait(?Send)]
impl ClockPort for BrowserClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }

    async fn sleep(&self, ms: u64) {
        TimeoutFuture::new(u32::try_from(ms).unwrap_or(u32::MAX)).await;
    }
}
