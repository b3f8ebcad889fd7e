//! The Forms screen: a text input echoed into a result label, and a switch
//! whose caption tells the user what the next click will do.

use tracing::info;

use crate::locator::Locator;
use crate::page::{BasePage, PageError};

/// Switch caption while the switch is off.
pub const SWITCH_OFF_TEXT: &str = "Click to turn the switch ON";

/// Switch caption while the switch is on.
pub const SWITCH_ON_TEXT: &str = "Click to turn the switch OFF";

/// Page object for the Forms tab.
#[derive(Clone)]
pub struct FormsPage {
    base: BasePage,
}

impl FormsPage {
    pub const FORMS_TAB: Locator = Locator::xpath_static("//android.widget.TextView[@text='Forms']");
    pub const INPUT_FIELD: Locator =
        Locator::xpath_static("//android.widget.EditText[@content-desc=\"text-input\"]");
    pub const INPUT_RESULT: Locator =
        Locator::xpath_static("//android.widget.TextView[@content-desc=\"input-text-result\"]");
    pub const SWITCH: Locator =
        Locator::xpath_static("//android.widget.Switch[@content-desc=\"switch\"]");
    pub const SWITCH_TEXT: Locator =
        Locator::xpath_static("//android.widget.TextView[@content-desc=\"switch-text\"]");

    pub fn new(base: BasePage) -> Self {
        Self {
            base: base.for_page("FormsPage"),
        }
    }

    pub fn base(&self) -> &BasePage {
        &self.base
    }

    /// Opens the Forms tab.
    pub async fn open_tab(&self) -> Result<(), PageError> {
        info!("Clicking the Forms tab");
        self.base
            .step("open_tab", "Forms", self.base.click(&Self::FORMS_TAB))
            .await
    }

    /// Replaces the input field's content with `text`.
    pub async fn type_in_input(&self, text: &str) -> Result<(), PageError> {
        info!(text, "Typing into input field");
        self.base.type_text(&Self::INPUT_FIELD, text).await
    }

    /// The text echoed below the input field.
    pub async fn typed_text(&self) -> Result<String, PageError> {
        self.base
            .step("typed_text", "", async {
                let text = self.base.find(&Self::INPUT_RESULT).await?.text().await?;
                info!(%text, "Retrieved result text");
                Ok(text)
            })
            .await
    }

    pub async fn toggle_switch(&self) -> Result<(), PageError> {
        info!("Toggling the switch");
        self.base.click(&Self::SWITCH).await
    }

    /// `true` when the switch reports `checked="true"`.
    pub async fn is_toggle_checked(&self) -> Result<bool, PageError> {
        self.base
            .step("is_toggle_checked", "", async {
                let element = self.base.find(&Self::SWITCH).await?;
                let checked = element.attribute("checked").await?.as_deref() == Some("true");
                info!(checked, "Switch checked status");
                Ok(checked)
            })
            .await
    }

    /// The caption next to the switch.
    pub async fn toggle_text(&self) -> Result<String, PageError> {
        self.base
            .step("toggle_text", "", async {
                let text = self.base.find(&Self::SWITCH_TEXT).await?.text().await?;
                info!(%text, "Toggle text");
                Ok(text)
            })
            .await
    }
}
