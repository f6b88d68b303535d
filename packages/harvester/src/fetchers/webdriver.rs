//! WebDriver-backed fetcher (chromedriver via thirtyfour).

use std::time::Duration;

use async_trait::async_trait;
use thirtyfour::prelude::*;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{HarvestError, HarvestResult};
use crate::traits::fetcher::{FetcherFactory, PageFetcher};

const SIGN_IN_OVERLAY_CLOSE: &str = "button.forcelogin-close-btn";
const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight);";

const OVERLAY_WAIT: Duration = Duration::from_secs(3);
const OVERLAY_POLL: Duration = Duration::from_millis(250);
const OVERLAY_SETTLE: Duration = Duration::from_millis(400);
const DEFAULT_SETTLE: Duration = Duration::from_secs(1);

/// Opens Chrome sessions against a running chromedriver.
#[derive(Debug, Clone)]
pub struct WebDriverFactory {
    server_url: String,
    settle: Duration,
}

impl WebDriverFactory {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            settle: DEFAULT_SETTLE,
        }
    }

    /// How long to let client-side rendering run after each navigation.
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }
}

#[async_trait]
impl FetcherFactory for WebDriverFactory {
    async fn connect(&self, headless: bool) -> HarvestResult<Box<dyn PageFetcher>> {
        let fetcher = WebDriverFetcher::connect(&self.server_url, headless, self.settle).await?;
        Ok(Box::new(fetcher))
    }
}

/// One Chrome session. Calls are serialized because tab switching is global
/// session state.
pub struct WebDriverFetcher {
    driver: WebDriver,
    listing_tab: WindowHandle,
    settle: Duration,
    lock: Mutex<()>,
}

impl WebDriverFetcher {
    pub async fn connect(server_url: &str, headless: bool, settle: Duration) -> HarvestResult<Self> {
        let mut args = vec![
            "--disable-notifications",
            "--window-size=1920,1080",
            "--no-sandbox",
            "--disable-dev-shm-usage",
        ];
        if headless {
            args.insert(0, "--headless=new");
        }

        let mut caps = DesiredCapabilities::chrome();
        caps.add_chrome_option("args", args)
            .map_err(HarvestError::session)?;

        let driver = WebDriver::new(server_url, caps)
            .await
            .map_err(HarvestError::session)?;
        let listing_tab = driver.window().await.map_err(HarvestError::session)?;

        debug!(server_url = %server_url, headless, "browser session started");

        Ok(Self {
            driver,
            listing_tab,
            settle,
            lock: Mutex::new(()),
        })
    }

    /// Close the "force sign-in" overlay if one shows up. Absence is normal.
    async fn dismiss_sign_in_overlay(&self) {
        let button = self
            .driver
            .query(By::Css(SIGN_IN_OVERLAY_CLOSE))
            .wait(OVERLAY_WAIT, OVERLAY_POLL)
            .first()
            .await;

        match button {
            Ok(button) => match button.click().await {
                Ok(()) => tokio::time::sleep(OVERLAY_SETTLE).await,
                Err(e) => debug!(error = %e, "sign-in overlay not clickable"),
            },
            Err(_) => debug!("no sign-in overlay"),
        }
    }

    async fn render_in_current_tab(&self, url: &str) -> HarvestResult<String> {
        self.driver
            .goto(url)
            .await
            .map_err(|e| HarvestError::navigation(url, e))?;
        tokio::time::sleep(self.settle).await;
        self.driver
            .source()
            .await
            .map_err(|e| HarvestError::listing(url, e))
    }
}

#[async_trait]
impl PageFetcher for WebDriverFetcher {
    async fn load_results_page(&self, url: &str) -> HarvestResult<String> {
        let _guard = self.lock.lock().await;

        self.driver
            .goto(url)
            .await
            .map_err(|e| HarvestError::navigation(url, e))?;
        self.dismiss_sign_in_overlay().await;
        self.driver
            .execute(SCROLL_TO_BOTTOM, Vec::new())
            .await
            .map_err(|e| HarvestError::navigation(url, e))?;
        tokio::time::sleep(self.settle).await;

        self.driver.source().await.map_err(HarvestError::session)
    }

    async fn load_detail_page(&self, url: &str) -> HarvestResult<String> {
        let _guard = self.lock.lock().await;

        let tab = self
            .driver
            .new_tab()
            .await
            .map_err(|e| HarvestError::listing(url, e))?;
        // Focus is still on the listing tab if this fails, so nothing to close
        self.driver
            .switch_to_window(tab)
            .await
            .map_err(|e| HarvestError::listing(url, e))?;

        let html = self.render_in_current_tab(url).await;

        let restored = match self.driver.close_window().await {
            Ok(()) => self.driver.switch_to_window(self.listing_tab.clone()).await,
            Err(e) => Err(e),
        };
        if let Err(e) = restored {
            warn!(url = %url, error = %e, "could not return to the listing tab");
            return Err(HarvestError::session(e));
        }

        html
    }

    async fn shutdown(&self) -> HarvestResult<()> {
        let _guard = self.lock.lock().await;
        self.driver
            .clone()
            .quit()
            .await
            .map_err(HarvestError::session)
    }
}
