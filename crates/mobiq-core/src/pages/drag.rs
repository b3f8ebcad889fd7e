//! The drag-and-drop puzzle screen.
//!
//! Nine tiles (`drag-l1` .. `drag-r3`) sit below the `renew` button; each
//! belongs on the drop zone with the same position id. A placed tile leaves
//! the draggable collection. Once all nine are placed the app shows a success
//! message with a Retry button.

use std::time::Duration;

use tracing::info;

use crate::element::Element;
use crate::locator::Locator;
use crate::page::{BasePage, PageError};

/// Tile position ids in row-major order.
pub const PUZZLE_ORDER: [&str; 9] = ["l1", "c1", "r1", "l2", "c2", "r2", "l3", "c3", "r3"];

/// Implicit wait installed after a reset so the redrawn tiles are picked up.
const RESET_IMPLICIT_WAIT: Duration = Duration::from_secs(3);

/// Locator of the draggable image for tile `position`.
pub fn drag_tile_locator(position: &str) -> Locator {
    Locator::xpath(format!(
        "//android.view.ViewGroup[@content-desc=\"drag-{position}\"]/android.widget.ImageView"
    ))
}

/// Locator of the drop zone for `position`.
pub fn drop_zone_locator(position: &str) -> Locator {
    Locator::xpath(format!(
        "//android.view.ViewGroup[@content-desc=\"drop-{position}\"]/android.view.ViewGroup"
    ))
}

/// Page object for the Drag screen.
#[derive(Clone)]
pub struct DragPage {
    base: BasePage,
}

impl DragPage {
    pub const DRAG_TAB: Locator = Locator::accessibility_id("Drag");
    /// Every tile still waiting to be placed.
    pub const DRAG_ELEMENTS: Locator = Locator::xpath_static(
        "//android.view.ViewGroup[@content-desc=\"renew\"]/following-sibling::android.view.ViewGroup[starts-with(@content-desc, \"drag-\")]",
    );
    pub const RESET_BUTTON: Locator =
        Locator::xpath_static("//android.view.ViewGroup[@content-desc=\"renew\"]");
    pub const SUCCESS_TEXT: Locator = Locator::xpath_static(
        "//android.widget.TextView[@text=\"You made it, click retry if you want to try it again.\"]",
    );
    pub const RETRY_BUTTON: Locator = Locator::xpath_static(
        "//android.view.ViewGroup[@content-desc=\"button-Retry\"]/android.view.ViewGroup",
    );

    pub fn new(base: BasePage) -> Self {
        Self {
            base: base.for_page("DragPage"),
        }
    }

    pub fn base(&self) -> &BasePage {
        &self.base
    }

    /// Opens the Drag tab from the tab bar.
    pub async fn open_tab(&self) -> Result<(), PageError> {
        self.base
            .step("open_tab", "Drag", self.base.click(&Self::DRAG_TAB))
            .await
    }

    /// All tiles currently rendered below the `renew` button.
    pub async fn drag_tiles(&self) -> Result<Vec<Element>, PageError> {
        self.base.find_many(&Self::DRAG_ELEMENTS).await
    }

    /// The draggable tile at `position` (`l1`, `c2`, ...).
    pub async fn drag_tile(&self, position: &str) -> Result<Element, PageError> {
        self.base.find(&drag_tile_locator(position)).await
    }

    /// The drop zone at `position`.
    pub async fn drop_zone(&self, position: &str) -> Result<Element, PageError> {
        self.base.find(&drop_zone_locator(position)).await
    }

    /// Drags tile `from` onto drop zone `to`, center to center.
    pub async fn drag_tile_to(&self, from: &str, to: &str) -> Result<(), PageError> {
        self.base
            .step(
                "drag_tile_to",
                format!("{from} -> {to}"),
                self.base.drag(&drag_tile_locator(from), &drop_zone_locator(to)),
            )
            .await?;
        info!(from, to, "Dragged tile");
        Ok(())
    }

    /// Places every tile on its matching zone in row-major order.
    pub async fn solve_puzzle(&self) -> Result<(), PageError> {
        self.base
            .step("solve_puzzle", "", async {
                for position in PUZZLE_ORDER {
                    self.drag_tile_to(position, position).await?;
                }
                info!("Puzzle solved via drag and drop");
                Ok(())
            })
            .await
    }

    /// Whether the completion message is shown.
    ///
    /// A wait timeout reads as `false` rather than an error.
    pub async fn is_success_screen_displayed(&self) -> Result<bool, PageError> {
        self.base.is_visible(&Self::SUCCESS_TEXT).await
    }

    /// Clicks `renew` to put every tile back.
    pub async fn click_reset(&self) -> Result<(), PageError> {
        self.base.click(&Self::RESET_BUTTON).await?;
        self.base.set_implicit_wait(RESET_IMPLICIT_WAIT).await
    }

    /// Clicks Retry on the success screen to start over.
    pub async fn click_retry(&self) -> Result<(), PageError> {
        self.base.click(&Self::RETRY_BUTTON).await
    }
}
