//! The scenario catalogue for the demo app.

use crate::pages::forms::{SWITCH_OFF_TEXT, SWITCH_ON_TEXT};
use crate::scenario::{Scenario, ScenarioContext, ScenarioError};

pub const DRAG_TAG: &str = "drag";
pub const FORMS_TAG: &str = "forms";

/// Inputs for `input_reflects_typed_text`, as (case label, text).
pub fn text_input_cases() -> Vec<(&'static str, String)> {
    vec![
        ("Hello world", "Hello world".to_string()),
        ("123456", "123456".to_string()),
        ("!@#$%^&*()", "!@#$%^&*()".to_string()),
        ("Hi there 😊", "Hi there 😊".to_string()),
        ("empty", String::new()),
        ("30 chars", "a".repeat(30)),
    ]
}

/// Every scenario, drag first.
pub fn catalogue() -> Vec<Scenario> {
    let mut scenarios = vec![
        Scenario::new("solve_puzzle", &[DRAG_TAG], solve_puzzle),
        Scenario::new("drag_and_reset", &[DRAG_TAG], drag_and_reset),
    ];
    for (label, text) in text_input_cases() {
        scenarios.push(Scenario::new(
            format!("input_reflects_typed_text[{label}]"),
            &[FORMS_TAG],
            move |ctx| input_reflects_typed_text(ctx, text.clone()),
        ));
    }
    scenarios.push(Scenario::new(
        "toggle_switch_on_and_off",
        &[FORMS_TAG],
        toggle_switch_on_and_off,
    ));
    scenarios
}

/// Solves the puzzle, checks the success screen, and checks Retry restores
/// every tile.
pub async fn solve_puzzle(ctx: ScenarioContext) -> Result<(), ScenarioError> {
    let page = ctx.drag_page();
    page.open_tab().await?;

    let initial = page.drag_tiles().await?.len();
    page.solve_puzzle().await?;

    let success = page.is_success_screen_displayed().await?;
    ctx.verify(
        "Verify that the success screen is displayed",
        success,
        "Success screen not found",
    )
    .await?;

    page.click_retry().await?;
    let after_retry = page.drag_tiles().await?.len();
    ctx.verify(
        "Verify tiles are reset after clicking Retry",
        after_retry == initial,
        format!("Retry did not reset puzzle: {initial} tiles before, {after_retry} after"),
    )
    .await
}

/// Places two tiles, checks they left the collection, then checks Reset
/// puts them back.
pub async fn drag_and_reset(ctx: ScenarioContext) -> Result<(), ScenarioError> {
    let page = ctx.drag_page();
    page.open_tab().await?;

    let initial = page.drag_tiles().await?.len();
    page.drag_tile_to("l1", "l1").await?;
    page.drag_tile_to("c2", "c2").await?;

    let after_drag = page.drag_tiles().await?.len();
    ctx.verify(
        "Verify drag reduced the number of visible tiles",
        after_drag < initial,
        "Tiles not removed after drag",
    )
    .await?;

    page.click_reset().await?;
    let after_reset = page.drag_tiles().await?.len();
    ctx.verify(
        "Verify all tiles are restored after reset",
        after_reset == initial,
        "Reset did not restore original tiles",
    )
    .await
}

/// Types `text` and checks the result label echoes it exactly.
pub async fn input_reflects_typed_text(ctx: ScenarioContext, text: String) -> Result<(), ScenarioError> {
    let page = ctx.forms_page();
    page.open_tab().await?;

    page.type_in_input(&text).await?;
    let actual = page.typed_text().await?;
    ctx.verify_eq(
        &format!("Verify that input text '{text}' is reflected correctly"),
        actual,
        text.clone(),
    )
    .await
}

/// Toggles the switch on and off, checking state and caption each time.
pub async fn toggle_switch_on_and_off(ctx: ScenarioContext) -> Result<(), ScenarioError> {
    let page = ctx.forms_page();
    page.open_tab().await?;

    page.toggle_switch().await?;
    let checked = page.is_toggle_checked().await?;
    ctx.verify("Verify toggle is ON", checked, "Expected toggle to be ON")
        .await?;
    ctx.verify_eq(
        "Verify toggle label says 'Click to turn the switch OFF'",
        page.toggle_text().await?,
        SWITCH_ON_TEXT.to_string(),
    )
    .await?;

    page.toggle_switch().await?;
    let checked = page.is_toggle_checked().await?;
    ctx.verify("Verify toggle is OFF", !checked, "Expected toggle to be OFF")
        .await?;
    ctx.verify_eq(
        "Verify toggle label says 'Click to turn the switch ON'",
        page.toggle_text().await?,
        SWITCH_OFF_TEXT.to_string(),
    )
    .await
}
