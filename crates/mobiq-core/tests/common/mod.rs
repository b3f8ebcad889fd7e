//! Shared test helpers for mobiq-core integration tests.
//!
//! Two doubles live here: [`FakeDevice`], an in-process model of the demo
//! app behind the `AutomationDriver` trait, and `wiremock` helpers that
//! answer W3C WebDriver requests for the Appium backend tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use mobiq_core::appium::SessionFactory;
use mobiq_core::driver::{AutomationDriver, DriverError};
use mobiq_core::element::{ElementId, Point, Rect};
use mobiq_core::gesture::{PointerAction, PointerSequence};
use mobiq_core::locator::Locator;
use mobiq_core::page::BasePage;
use mobiq_core::pages::drag::{drag_tile_locator, drop_zone_locator, PUZZLE_ORDER};
use mobiq_core::pages::forms::{SWITCH_OFF_TEXT, SWITCH_ON_TEXT};
use mobiq_core::pages::{DragPage, FormsPage};
use mobiq_core::wait::Wait;

/// Bytes every fake screenshot starts with.
pub const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

/// A short wait budget for tests that run on a paused clock.
pub fn test_wait() -> Wait {
    Wait::new(Duration::from_secs(2), Duration::from_millis(100))
}

// ---------------------------------------------------------------------------
// Fake device
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Home,
    Drag,
    Forms,
}

#[derive(Debug)]
struct AppState {
    screen: Screen,
    placed: [bool; 9],
    /// Bumped whenever the tiles are redrawn; older tile handles go stale.
    generation: u32,
    input: String,
    switch_on: bool,
    implicit_wait: Option<Duration>,
    /// Zones that refuse drops, to model a broken puzzle.
    jammed: Vec<usize>,
    screenshot_fails: bool,
    quit: bool,
    gestures: Vec<PointerSequence>,
    clicks: Vec<String>,
}

/// In-process model of the WebdriverIO demo app's Drag and Forms screens.
///
/// Tiles sit in a 3x3 grid at the bottom of the Drag screen and drop zones
/// in a 3x3 grid above them. A gesture places a tile when it presses inside
/// the tile, holds, and releases inside the zone with the same position id.
/// Placed tiles leave the tree, so their handles go stale.
#[derive(Debug)]
pub struct FakeDevice {
    state: Mutex<AppState>,
}

impl Default for FakeDevice {
    fn default() -> Self {
        Self {
            state: Mutex::new(AppState {
                screen: Screen::Home,
                placed: [false; 9],
                generation: 0,
                input: String::new(),
                switch_on: false,
                implicit_wait: None,
                jammed: Vec::new(),
                screenshot_fails: false,
                quit: false,
                gestures: Vec::new(),
                clicks: Vec::new(),
            }),
        }
    }
}

impl FakeDevice {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A device whose drop zone at `position` never accepts a tile.
    pub fn with_jammed_zone(position: &str) -> Arc<Self> {
        let device = Self::default();
        device.lock().jammed.push(index_of(position));
        Arc::new(device)
    }

    pub fn fail_screenshots(&self) {
        self.lock().screenshot_fails = true;
    }

    pub fn screen(&self) -> Screen {
        self.lock().screen
    }

    pub fn placed_count(&self) -> usize {
        self.lock().placed.iter().filter(|p| **p).count()
    }

    pub fn gestures(&self) -> Vec<PointerSequence> {
        self.lock().gestures.clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.lock().clicks.clone()
    }

    pub fn implicit_wait(&self) -> Option<Duration> {
        self.lock().implicit_wait
    }

    pub fn input(&self) -> String {
        self.lock().input.clone()
    }

    pub fn is_quit(&self) -> bool {
        self.lock().quit
    }

    pub fn tile_rect(position: &str) -> Rect {
        grid_rect(index_of(position), 1200)
    }

    pub fn zone_rect(position: &str) -> Rect {
        grid_rect(index_of(position), 300)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, AppState> {
        self.state.lock().unwrap()
    }

    fn live(&self) -> Result<std::sync::MutexGuard<'_, AppState>, DriverError> {
        let state = self.lock();
        if state.quit {
            Err(DriverError::NotConnected)
        } else {
            Ok(state)
        }
    }
}

fn index_of(position: &str) -> usize {
    PUZZLE_ORDER
        .iter()
        .position(|p| *p == position)
        .unwrap_or_else(|| panic!("unknown tile position {position}"))
}

fn grid_rect(index: usize, top: i32) -> Rect {
    let (col, row) = ((index % 3) as i32, (index / 3) as i32);
    Rect {
        x: 100 + col * 200,
        y: top + row * 200,
        width: 181,
        height: 181,
    }
}

/// What a fake element handle refers to.
#[derive(Debug, Clone, PartialEq)]
enum Node {
    DragTab,
    FormsTab,
    Tile(usize, u32),
    Zone(usize),
    Renew,
    SuccessText,
    Retry,
    Input,
    InputResult,
    Switch,
    SwitchText,
}

impl Node {
    fn id(&self) -> ElementId {
        ElementId::new(match self {
            Node::DragTab => "tab-drag".to_string(),
            Node::FormsTab => "tab-forms".to_string(),
            Node::Tile(i, generation) => format!("tile-{}-{generation}", PUZZLE_ORDER[*i]),
            Node::Zone(i) => format!("zone-{}", PUZZLE_ORDER[*i]),
            Node::Renew => "renew".to_string(),
            Node::SuccessText => "success".to_string(),
            Node::Retry => "retry".to_string(),
            Node::Input => "input".to_string(),
            Node::InputResult => "input-result".to_string(),
            Node::Switch => "switch".to_string(),
            Node::SwitchText => "switch-text".to_string(),
        })
    }

    fn parse(id: &ElementId) -> Option<Node> {
        let s = id.as_str();
        let node = match s {
            "tab-drag" => Node::DragTab,
            "tab-forms" => Node::FormsTab,
            "renew" => Node::Renew,
            "success" => Node::SuccessText,
            "retry" => Node::Retry,
            "input" => Node::Input,
            "input-result" => Node::InputResult,
            "switch" => Node::Switch,
            "switch-text" => Node::SwitchText,
            _ => {
                if let Some(rest) = s.strip_prefix("tile-") {
                    let (pos, generation) = rest.split_once('-')?;
                    Node::Tile(index_of(pos), generation.parse().ok()?)
                } else {
                    Node::Zone(index_of(s.strip_prefix("zone-")?))
                }
            }
        };
        Some(node)
    }
}

impl AppState {
    fn solved(&self) -> bool {
        self.placed.iter().all(|p| *p)
    }

    fn redraw_tiles(&mut self) {
        self.placed = [false; 9];
        self.generation += 1;
    }

    fn unplaced_tiles(&self) -> Vec<Node> {
        (0..9)
            .filter(|i| !self.placed[*i])
            .map(|i| Node::Tile(i, self.generation))
            .collect()
    }

    /// Nodes currently in the tree that `locator` matches.
    fn resolve(&self, locator: &Locator) -> Vec<Node> {
        if *locator == DragPage::DRAG_TAB {
            return vec![Node::DragTab];
        }
        if *locator == FormsPage::FORMS_TAB {
            return vec![Node::FormsTab];
        }
        match self.screen {
            Screen::Home => Vec::new(),
            Screen::Drag => self.resolve_drag(locator),
            Screen::Forms => self.resolve_forms(locator),
        }
    }

    fn resolve_drag(&self, locator: &Locator) -> Vec<Node> {
        if self.solved() {
            return if *locator == DragPage::SUCCESS_TEXT {
                vec![Node::SuccessText]
            } else if *locator == DragPage::RETRY_BUTTON {
                vec![Node::Retry]
            } else {
                Vec::new()
            };
        }
        if *locator == DragPage::DRAG_ELEMENTS {
            return self.unplaced_tiles();
        }
        if *locator == DragPage::RESET_BUTTON {
            return vec![Node::Renew];
        }
        for (i, pos) in PUZZLE_ORDER.iter().enumerate() {
            if *locator == drag_tile_locator(pos) {
                return if self.placed[i] {
                    Vec::new()
                } else {
                    vec![Node::Tile(i, self.generation)]
                };
            }
            if *locator == drop_zone_locator(pos) {
                return vec![Node::Zone(i)];
            }
        }
        Vec::new()
    }

    fn resolve_forms(&self, locator: &Locator) -> Vec<Node> {
        let node = if *locator == FormsPage::INPUT_FIELD {
            Node::Input
        } else if *locator == FormsPage::INPUT_RESULT {
            Node::InputResult
        } else if *locator == FormsPage::SWITCH {
            Node::Switch
        } else if *locator == FormsPage::SWITCH_TEXT {
            Node::SwitchText
        } else {
            return Vec::new();
        };
        vec![node]
    }

    /// Checks a handle still points at a node in the current tree.
    fn attached(&self, id: &ElementId) -> Result<Node, DriverError> {
        let stale = || DriverError::StaleElement(id.to_string());
        let node = Node::parse(id).ok_or_else(stale)?;
        let present = match &node {
            Node::DragTab | Node::FormsTab => true,
            Node::Tile(i, generation) => {
                self.screen == Screen::Drag
                    && !self.solved()
                    && *generation == self.generation
                    && !self.placed[*i]
            }
            Node::Zone(_) | Node::Renew => self.screen == Screen::Drag && !self.solved(),
            Node::SuccessText | Node::Retry => self.screen == Screen::Drag && self.solved(),
            Node::Input | Node::InputResult | Node::Switch | Node::SwitchText => {
                self.screen == Screen::Forms
            }
        };
        if present {
            Ok(node)
        } else {
            Err(stale())
        }
    }

    fn rect_of(node: &Node) -> Rect {
        match node {
            Node::Tile(i, _) => grid_rect(*i, 1200),
            Node::Zone(i) => grid_rect(*i, 300),
            _ => Rect {
                x: 0,
                y: 0,
                width: 100,
                height: 50,
            },
        }
    }

    /// Interprets a single-pointer drag: press inside a tile, hold, release
    /// inside the zone with the same position id.
    fn apply_gesture(&mut self, sequence: &PointerSequence) {
        let mut cursor: Option<Point> = None;
        let mut pressed_at: Option<Point> = None;
        let mut held = Duration::ZERO;
        let mut released_at: Option<Point> = None;
        for action in sequence.actions() {
            match action {
                PointerAction::MoveTo { point, .. } => cursor = Some(*point),
                PointerAction::Down => pressed_at = cursor,
                PointerAction::Pause(d) if pressed_at.is_some() && released_at.is_none() => {
                    held += *d
                }
                PointerAction::Pause(_) => {}
                PointerAction::Up => released_at = cursor,
            }
        }
        let (Some(from), Some(to)) = (pressed_at, released_at) else {
            return;
        };
        if held.is_zero() || self.screen != Screen::Drag || self.solved() {
            return;
        }
        let Some(tile) = (0..9).find(|i| !self.placed[*i] && grid_rect(*i, 1200).contains(from)) else {
            return;
        };
        if grid_rect(tile, 300).contains(to) && !self.jammed.contains(&tile) {
            self.placed[tile] = true;
        }
    }
}

#[async_trait]
impl AutomationDriver for FakeDevice {
    async fn find_elements(&self, locator: &Locator) -> Result<Vec<ElementId>, DriverError> {
        let state = self.live()?;
        Ok(state.resolve(locator).iter().map(Node::id).collect())
    }

    async fn element_rect(&self, element: &ElementId) -> Result<Rect, DriverError> {
        let state = self.live()?;
        let node = state.attached(element)?;
        Ok(AppState::rect_of(&node))
    }

    async fn element_text(&self, element: &ElementId) -> Result<String, DriverError> {
        let state = self.live()?;
        Ok(match state.attached(element)? {
            Node::InputResult => state.input.clone(),
            Node::SwitchText if state.switch_on => SWITCH_ON_TEXT.to_string(),
            Node::SwitchText => SWITCH_OFF_TEXT.to_string(),
            Node::SuccessText => "You made it, click retry if you want to try it again.".to_string(),
            Node::DragTab => "Drag".to_string(),
            Node::FormsTab => "Forms".to_string(),
            _ => String::new(),
        })
    }

    async fn element_attribute(
        &self,
        element: &ElementId,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        let state = self.live()?;
        let node = state.attached(element)?;
        Ok(match (node, name) {
            (Node::Switch, "checked") => Some(state.switch_on.to_string()),
            (_, "checked") => Some("false".to_string()),
            _ => None,
        })
    }

    async fn is_displayed(&self, element: &ElementId) -> Result<bool, DriverError> {
        self.live()?.attached(element).map(|_| true)
    }

    async fn is_enabled(&self, element: &ElementId) -> Result<bool, DriverError> {
        self.live()?.attached(element).map(|_| true)
    }

    async fn click(&self, element: &ElementId) -> Result<(), DriverError> {
        let mut state = self.live()?;
        let node = state.attached(element)?;
        state.clicks.push(element.to_string());
        match node {
            Node::DragTab => state.screen = Screen::Drag,
            Node::FormsTab => state.screen = Screen::Forms,
            Node::Renew | Node::Retry => state.redraw_tiles(),
            Node::Switch => state.switch_on = !state.switch_on,
            _ => {}
        }
        Ok(())
    }

    async fn clear(&self, element: &ElementId) -> Result<(), DriverError> {
        let mut state = self.live()?;
        if state.attached(element)? == Node::Input {
            state.input.clear();
        }
        Ok(())
    }

    async fn send_keys(&self, element: &ElementId, text: &str) -> Result<(), DriverError> {
        let mut state = self.live()?;
        match state.attached(element)? {
            Node::Input => {
                state.input.push_str(text);
                Ok(())
            }
            _ => Err(DriverError::NotInteractable(element.to_string())),
        }
    }

    async fn perform_actions(&self, sequence: &PointerSequence) -> Result<(), DriverError> {
        let mut state = self.live()?;
        state.gestures.push(sequence.clone());
        state.apply_gesture(sequence);
        Ok(())
    }

    async fn set_implicit_wait(&self, timeout: Duration) -> Result<(), DriverError> {
        let mut state = self.live()?;
        state.implicit_wait = Some(timeout);
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, DriverError> {
        let state = self.live()?;
        if state.screenshot_fails {
            return Err(DriverError::CommandFailed {
                error: "unknown error".into(),
                message: "screen capture unavailable".into(),
            });
        }
        Ok(PNG_MAGIC.to_vec())
    }

    async fn quit(&self) -> Result<(), DriverError> {
        let mut state = self.live()?;
        state.quit = true;
        Ok(())
    }
}

/// A [`BasePage`] bound to `device` with the short test wait.
pub fn base_page(device: &Arc<FakeDevice>) -> BasePage {
    BasePage::new(device.clone(), test_wait(), "Test")
}

/// A [`SessionFactory`] handing out fresh [`FakeDevice`]s and remembering
/// each one for inspection.
#[derive(Default)]
pub struct FakeSessions {
    opened: Mutex<Vec<Arc<FakeDevice>>>,
    jammed_zone: Option<&'static str>,
    screenshot_fails: bool,
    refuse: bool,
}

impl FakeSessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_jammed_zone(position: &'static str) -> Self {
        Self {
            jammed_zone: Some(position),
            ..Self::default()
        }
    }

    pub fn with_failing_screenshots() -> Self {
        Self {
            screenshot_fails: true,
            ..Self::default()
        }
    }

    /// Every `open` fails as if no device were attached.
    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }

    pub fn opened(&self) -> Vec<Arc<FakeDevice>> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionFactory for FakeSessions {
    async fn open(&self) -> Result<Arc<dyn AutomationDriver>, DriverError> {
        if self.refuse {
            return Err(DriverError::SessionNotCreated(
                "Could not find a connected Android device".into(),
            ));
        }
        let device = match self.jammed_zone {
            Some(position) => FakeDevice::with_jammed_zone(position),
            None => FakeDevice::new(),
        };
        if self.screenshot_fails {
            device.fail_screenshots();
        }
        self.opened.lock().unwrap().push(device.clone());
        Ok(device)
    }
}

// ---------------------------------------------------------------------------
// Mock Appium server
// ---------------------------------------------------------------------------

/// Path of the session resource the mock Appium server hands out.
pub const SESSION_PATH: &str = "/wd/hub/session/sess-1";

/// Base URL including the `/wd/hub` prefix Appium 1.x serves under.
pub fn hub_url(server: &MockServer) -> String {
    format!("{}/wd/hub", server.uri())
}

/// A request as seen by the mock server, with its JSON body decoded.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub body: Value,
}

impl From<&Request> for Recorded {
    fn from(request: &Request) -> Self {
        Self {
            method: request.method.as_str().to_string(),
            path: request.url.path().to_string(),
            body: request.body_json().unwrap_or(Value::Null),
        }
    }
}

/// Every request the server has received so far, in arrival order.
pub async fn recorded(server: &MockServer) -> Vec<Recorded> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(Recorded::from)
        .collect()
}

/// Answers `POST /wd/hub/session` with the `sess-1` session.
pub async fn mount_session(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/wd/hub/session"))
        .respond_with(ok(json!({
            "sessionId": "sess-1",
            "capabilities": { "platformName": "Android" }
        })))
        .mount(server)
        .await;
}

/// `{"value": value}` with status 200.
pub fn ok(value: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "value": value }))
}

/// A W3C error response.
pub fn w3c_error(status: u16, error: &str, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({
        "value": { "error": error, "message": message, "stacktrace": "" }
    }))
}

/// A W3C element reference.
pub fn element_ref(id: &str) -> Value {
    json!({ "element-6066-11e4-a23c-4f2a6a2d4ff5": id })
}
