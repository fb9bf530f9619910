//! JSON HTTP API over the device controller.
//!
//! # Endpoints
//!
//! | Method | Path              | Description                                  |
//! |--------|-------------------|----------------------------------------------|
//! | GET    | `/status`         | Connection status                            |
//! | GET    | `/state`          | Committed state and its command packet       |
//! | POST   | `/connect`        | Open the tower and reset it                  |
//! | POST   | `/disconnect`     | Turn everything off and release the tower    |
//! | POST   | `/reconnect`      | Reopen and resend the committed state        |
//! | POST   | `/light`          | Whole tower to `{color, pattern}`            |
//! | POST   | `/leds`           | Named channels, `{leds, color?, pattern?}`   |
//! | POST   | `/buzzer`         | Buzzer `{sound, mode}`, sound 15 keeps pitch |
//! | POST   | `/buzzer/stop`    | Silence the buzzer                           |
//! | POST   | `/all`            | Lamps and buzzer in one packet               |
//! | POST   | `/reset`          | Everything off                               |
//! | POST   | `/turn_on_red`    | Whole tower red, steady (also yellow, green) |
//! | POST   | `/turn_off_led`   | All lamps off, buzzer untouched              |
//! | POST   | `/play_buzzer`    | Buzzer with defaults D7, three times         |
//!
//! Every response body is `{"success": bool, "message": string}`; `/state`
//! adds the state. Handlers run on rouille's worker threads and block on the
//! Tokio runtime for each controller call.

use std::net::SocketAddr;
use std::sync::Arc;

use patlite_core::{
    BuzzerMode, BuzzerSound, BuzzerUpdate, Channel, Color, DeviceState, Error, LedState,
    LedUpdate, Pattern, StateUpdate,
};
use patlite_hardware::DeviceController;
use patlite_protocol::encode;
use rouille::{Request, Response};
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};

/// Pitch used by `/play_buzzer` when no body is sent.
const DEFAULT_PLAY_SOUND: u8 = 6;
/// Repeat count used by `/play_buzzer` when no body is sent.
const DEFAULT_PLAY_MODE: u8 = 3;

/// Generic API response
#[derive(Debug, Serialize)]
struct ApiResponse {
    success: bool,
    message: String,
}

impl ApiResponse {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// One channel in a state report.
#[derive(Debug, Serialize)]
struct LedView {
    channel: Channel,
    color: Color,
    pattern: Pattern,
}

/// Committed state as reported by `/state`.
#[derive(Debug, Serialize)]
struct StateView {
    buzzer_sound: BuzzerSound,
    buzzer_mode: BuzzerMode,
    leds: Vec<LedView>,
    packet: String,
}

impl From<&DeviceState> for StateView {
    fn from(state: &DeviceState) -> Self {
        Self {
            buzzer_sound: state.buzzer_sound(),
            buzzer_mode: state.buzzer_mode(),
            leds: state
                .leds()
                .map(|(channel, led)| LedView {
                    channel,
                    color: led.color,
                    pattern: led.pattern,
                })
                .collect(),
            packet: encode(state).to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct StateResponse {
    success: bool,
    message: String,
    connected: bool,
    state: StateView,
}

/// Request body for `/light`
#[derive(Debug, Deserialize)]
struct LightRequest {
    color: u8,
    pattern: u8,
}

/// Request body for `/leds`
#[derive(Debug, Deserialize)]
struct LedsRequest {
    leds: Vec<String>,
    color: Option<u8>,
    pattern: Option<u8>,
}

/// Request body for `/buzzer`
#[derive(Debug, Deserialize)]
struct BuzzerRequest {
    sound: u8,
    mode: u8,
}

/// Request body for `/play_buzzer`, every field optional
#[derive(Debug, Deserialize)]
#[serde(default)]
struct PlayBuzzerRequest {
    sound: u8,
    mode: u8,
}

impl Default for PlayBuzzerRequest {
    fn default() -> Self {
        Self {
            sound: DEFAULT_PLAY_SOUND,
            mode: DEFAULT_PLAY_MODE,
        }
    }
}

/// Request body for `/all`
#[derive(Debug, Default, Deserialize)]
struct AllRequest {
    leds: Option<Vec<String>>,
    color: Option<u8>,
    pattern: Option<u8>,
    buzzer_sound: Option<u8>,
    buzzer_mode: Option<u8>,
}

fn parse_channels(names: &[String]) -> patlite_core::Result<Vec<Channel>> {
    names.iter().map(|name| name.parse()).collect()
}

/// Channels lit in their own color unless an explicit color is given.
fn led_update(
    names: &[String],
    color: Option<u8>,
    pattern: Option<u8>,
) -> patlite_core::Result<LedUpdate> {
    let channels = parse_channels(names)?;
    let pattern = match pattern {
        Some(raw) => Pattern::from_u8(raw)?,
        None => Pattern::On,
    };
    match color {
        Some(raw) => LedUpdate::uniform(&channels, LedState::new(Color::from_u8(raw)?, pattern)),
        None => LedUpdate::native(&channels, pattern),
    }
}

impl AllRequest {
    /// A buzzer block needs a mode; a sound alone would silently reset the
    /// repeat count. A pattern needs `leds` or `color` to apply to.
    fn into_update(self) -> patlite_core::Result<StateUpdate> {
        let leds = match (&self.leds, self.color, self.pattern) {
            (Some(names), color, pattern) => Some(led_update(names, color, pattern)?),
            (None, Some(color), pattern) => {
                let pattern = pattern.unwrap_or(Pattern::On.as_u8());
                Some(LedUpdate::whole_tower(LedState::from_raw(color, pattern)?))
            }
            (None, None, Some(_)) => {
                return Err(Error::invalid_parameter("pattern requires leds or color"));
            }
            (None, None, None) => None,
        };

        let buzzer = match (self.buzzer_sound, self.buzzer_mode) {
            (None, None) => None,
            (Some(_), None) => {
                return Err(Error::invalid_parameter("buzzer_sound requires buzzer_mode"));
            }
            (sound, Some(mode)) => Some(BuzzerUpdate::from_raw(
                sound.unwrap_or(patlite_core::constants::BUZZER_SOUND_KEEP),
                mode,
            )?),
        };

        StateUpdate::all(leds, buzzer)
    }
}

/// HTTP status for a controller error.
fn status_code(error: &Error) -> u16 {
    match error {
        Error::InvalidParameter(_) | Error::NotConnected => 400,
        Error::DeviceNotFound { .. } => 404,
        Error::TransportError(_) | Error::WriteFailed(_) | Error::Config(_) => 500,
    }
}

fn error_response(error: &Error) -> Response {
    let code = status_code(error);
    if code >= 500 {
        error!("Request failed: {}", error);
    } else {
        debug!("Request rejected: {}", error);
    }
    Response::json(&ApiResponse::err(error.to_string())).with_status_code(code)
}

fn bad_json(error: rouille::input::json::JsonError) -> Response {
    debug!("Invalid request body: {}", error);
    Response::json(&ApiResponse::err(format!("Invalid JSON: {error}"))).with_status_code(400)
}

/// HTTP front end bound to one controller.
#[derive(Debug, Clone)]
pub struct ApiServer {
    controller: Arc<DeviceController>,
    runtime: Handle,
}

impl ApiServer {
    /// The runtime handle must belong to a runtime that outlives the server.
    pub fn new(controller: Arc<DeviceController>, runtime: Handle) -> Self {
        Self {
            controller,
            runtime,
        }
    }

    pub fn controller(&self) -> &Arc<DeviceController> {
        &self.controller
    }

    /// Route one request. Never panics on bad input.
    pub fn handle_request(&self, request: &Request) -> Response {
        debug!("{} {}", request.method(), request.url());

        rouille::router!(request,
            (GET) ["/status"] => { self.get_status() },
            (GET) ["/state"] => { self.get_state() },

            (POST) ["/connect"] => { self.connect() },
            (POST) ["/disconnect"] => { self.disconnect() },
            (POST) ["/reconnect"] => { self.reconnect() },

            (POST) ["/light"] => { self.handle_light(request) },
            (POST) ["/leds"] => { self.handle_leds(request) },
            (POST) ["/buzzer"] => { self.handle_buzzer(request) },
            (POST) ["/buzzer/stop"] => {
                self.run(self.controller.stop_buzzer(), "Buzzer stopped")
            },
            (POST) ["/all"] => { self.handle_all(request) },
            (POST) ["/reset"] => { self.run(self.controller.reset(), "All lamps and buzzer off") },

            (POST) ["/turn_on_red"] => { self.turn_on(Color::Red) },
            (POST) ["/turn_on_yellow"] => { self.turn_on(Color::Yellow) },
            (POST) ["/turn_on_green"] => { self.turn_on(Color::Green) },
            (POST) ["/turn_off_led"] => { self.turn_off() },
            (POST) ["/turn_off_LED"] => { self.turn_off() },
            (POST) ["/play_buzzer"] => { self.handle_play_buzzer(request) },

            _ => {
                Response::json(&ApiResponse::err("Not found")).with_status_code(404)
            }
        )
    }

    /// Block on a state-changing controller call and map its outcome.
    fn run<F>(&self, operation: F, message: &str) -> Response
    where
        F: Future<Output = patlite_core::Result<DeviceState>>,
    {
        match self.runtime.block_on(operation) {
            Ok(_) => Response::json(&ApiResponse::ok(message)),
            Err(e) => error_response(&e),
        }
    }

    fn get_status(&self) -> Response {
        let status = self.controller.status();
        Response::json(&ApiResponse {
            success: status.is_connected(),
            message: status.to_string(),
        })
    }

    fn get_state(&self) -> Response {
        let state = self.runtime.block_on(self.controller.snapshot());
        let status = self.controller.status();
        Response::json(&StateResponse {
            success: true,
            message: status.to_string(),
            connected: status.is_connected(),
            state: StateView::from(&state),
        })
    }

    fn connect(&self) -> Response {
        if self.controller.status().is_connected() {
            return Response::json(&ApiResponse::ok("Already connected"));
        }
        match self.runtime.block_on(self.controller.connect()) {
            Ok(()) => {
                info!("Connected on request");
                Response::json(&ApiResponse::ok("Connected"))
            }
            Err(e) => error_response(&e),
        }
    }

    fn disconnect(&self) -> Response {
        let was_connected = self.controller.status().is_connected();
        self.runtime.block_on(self.controller.disconnect());
        let message = if was_connected {
            "Disconnected"
        } else {
            "Already disconnected"
        };
        Response::json(&ApiResponse::ok(message))
    }

    fn reconnect(&self) -> Response {
        self.run(self.controller.reconnect(), "Reconnected, state restored")
    }

    fn handle_light(&self, request: &Request) -> Response {
        let body: LightRequest = match rouille::input::json_input(request) {
            Ok(body) => body,
            Err(e) => return bad_json(e),
        };
        match LedState::from_raw(body.color, body.pattern) {
            Ok(led) => self.run(self.controller.set_light(led), "Light set"),
            Err(e) => error_response(&e),
        }
    }

    fn handle_leds(&self, request: &Request) -> Response {
        let body: LedsRequest = match rouille::input::json_input(request) {
            Ok(body) => body,
            Err(e) => return bad_json(e),
        };
        match led_update(&body.leds, body.color, body.pattern) {
            Ok(leds) => self.run(self.controller.set_leds(leds), "LEDs set"),
            Err(e) => error_response(&e),
        }
    }

    fn handle_buzzer(&self, request: &Request) -> Response {
        let body: BuzzerRequest = match rouille::input::json_input(request) {
            Ok(body) => body,
            Err(e) => return bad_json(e),
        };
        self.set_buzzer(body.sound, body.mode)
    }

    /// Body is optional; without a JSON content type the defaults apply.
    fn handle_play_buzzer(&self, request: &Request) -> Response {
        let body: PlayBuzzerRequest = if request.header("Content-Type").is_none() {
            PlayBuzzerRequest::default()
        } else {
            match rouille::input::json_input(request) {
                Ok(body) => body,
                Err(e) => return bad_json(e),
            }
        };
        self.set_buzzer(body.sound, body.mode)
    }

    fn set_buzzer(&self, sound: u8, mode: u8) -> Response {
        match BuzzerUpdate::from_raw(sound, mode) {
            Ok(buzzer) => self.run(self.controller.set_buzzer(buzzer), "Buzzer set"),
            Err(e) => error_response(&e),
        }
    }

    fn handle_all(&self, request: &Request) -> Response {
        let body: AllRequest = match rouille::input::json_input(request) {
            Ok(body) => body,
            Err(e) => return bad_json(e),
        };
        match body.into_update() {
            Ok(update) => self.run(self.controller.set_all(update), "All settings applied"),
            Err(e) => error_response(&e),
        }
    }

    fn turn_on(&self, color: Color) -> Response {
        let led = LedState::new(color, Pattern::On);
        self.run(self.controller.set_light(led), &format!("{color:?} lamp on"))
    }

    fn turn_off(&self) -> Response {
        self.run(self.controller.set_light(LedState::OFF), "All lamps off")
    }
}

/// Serve on `addr` until `shutdown` completes.
///
/// Blocks the calling thread, which must not be a runtime worker.
///
/// # Errors
///
/// Returns an error if the address cannot be bound.
pub fn serve(
    api: ApiServer,
    addr: SocketAddr,
    shutdown: impl Future<Output = ()>,
) -> anyhow::Result<()> {
    let runtime = api.runtime.clone();
    let server = rouille::Server::new(addr, move |request| api.handle_request(request))
        .map_err(|e| anyhow::anyhow!("failed to bind {addr}: {e}"))?;
    info!("HTTP API listening on http://{}", server.server_addr());

    let (handle, stop) = server.stoppable();
    runtime.block_on(shutdown);

    info!("Stopping HTTP API");
    // The server thread may already be gone; join reports how it ended.
    let _ = stop.send(());
    if handle.join().is_err() {
        warn!("HTTP server thread panicked");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Error::invalid_parameter("x"), 400)]
    #[case(Error::NotConnected, 400)]
    #[case(Error::device_not_found(0x191a, 0x8003), 404)]
    #[case(Error::transport("x"), 500)]
    #[case(Error::write_failed("x"), 500)]
    fn test_status_code(#[case] error: Error, #[case] expected: u16) {
        assert_eq!(status_code(&error), expected);
    }

    #[test]
    fn test_leds_default_to_native_color() {
        let names = vec!["red".to_string(), "GREEN".to_string()];
        let update = led_update(&names, None, None).unwrap();
        assert_eq!(
            update.assignments(),
            &[
                (Channel::Red, LedState::new(Color::Red, Pattern::On)),
                (Channel::Green, LedState::new(Color::Green, Pattern::On)),
            ]
        );
    }

    #[test]
    fn test_leds_reject_unknown_channel() {
        let names = vec!["ORANGE".to_string()];
        assert!(led_update(&names, None, None).unwrap_err().is_invalid_parameter());
    }

    #[test]
    fn test_all_request_mode_only_keeps_sound() {
        let request = AllRequest {
            buzzer_mode: Some(2),
            ..AllRequest::default()
        };
        let update = request.into_update().unwrap();
        assert_eq!(update.leds, None);
        assert_eq!(
            update.buzzer,
            Some(BuzzerUpdate::new(None, BuzzerMode::new(2).unwrap()))
        );
    }

    #[test]
    fn test_all_request_sound_without_mode_is_rejected() {
        let request = AllRequest {
            buzzer_sound: Some(9),
            ..AllRequest::default()
        };
        assert!(request.into_update().unwrap_err().is_invalid_parameter());
    }

    #[test]
    fn test_all_request_stray_pattern_is_rejected() {
        let request = AllRequest {
            pattern: Some(2),
            buzzer_mode: Some(1),
            ..AllRequest::default()
        };
        assert!(request.into_update().unwrap_err().is_invalid_parameter());
    }

    #[test]
    fn test_all_request_empty_is_rejected() {
        let result = AllRequest::default().into_update();
        assert!(result.unwrap_err().is_invalid_parameter());
    }

    #[test]
    fn test_state_view_reports_packet() {
        let view = StateView::from(&DeviceState::default());
        assert_eq!(view.leds.len(), 5);
        assert_eq!(view.packet, "00 00 00 00 00 00 00 00 00");
    }
}
