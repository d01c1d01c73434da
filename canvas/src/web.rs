//! Browser WebSocket transport.
//!
//! Frames go out as protobuf binary messages. Inbound messages may be binary
//! or JSON text; the relay answers in the encoding it received.

use frames::Frame;
use js_sys::{ArrayBuffer, Uint8Array};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{BinaryType, WebSocket};

use crate::session::{Transport, TransportError};

/// [`Transport`] over a browser `WebSocket`.
pub struct WebSocketTransport {
    socket: WebSocket,
}

impl WebSocketTransport {
    /// Open a socket to `url` (e.g. `wss://host/api/ws?name=Ann`).
    ///
    /// # Errors
    ///
    /// Returns the browser's error if the URL is rejected.
    pub fn open(url: &str) -> Result<Self, JsValue> {
        let socket = WebSocket::new(url)?;
        socket.set_binary_type(BinaryType::Arraybuffer);
        Ok(Self { socket })
    }

    /// The underlying socket, for wiring `onmessage`/`onopen` callbacks.
    #[must_use]
    pub fn socket(&self) -> &WebSocket {
        &self.socket
    }

    /// Close the socket.
    ///
    /// # Errors
    ///
    /// Returns the browser's error if the socket refuses to close.
    pub fn close(&self) -> Result<(), JsValue> {
        self.socket.close()
    }
}

impl Transport for WebSocketTransport {
    fn is_connected(&self) -> bool {
        self.socket.ready_state() == WebSocket::OPEN
    }

    fn send(&mut self, frame: Frame) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::Disconnected);
        }
        self.socket
            .send_with_u8_array(&frames::encode_frame(&frame))
            .map_err(|e| TransportError::Send(format!("{e:?}")))
    }
}

/// Decode a `MessageEvent::data()` payload into a frame.
///
/// # Errors
///
/// Returns [`TransportError::Decode`] for payloads that are neither a valid
/// protobuf frame nor a valid JSON frame.
pub fn decode_message(data: &JsValue) -> Result<Frame, TransportError> {
    if let Some(buffer) = data.dyn_ref::<ArrayBuffer>() {
        let bytes = Uint8Array::new(buffer).to_vec();
        return frames::decode_frame(&bytes).map_err(|e| TransportError::Decode(e.to_string()));
    }
    let Some(text) = data.as_string() else {
        return Err(TransportError::Decode("unsupported message payload".into()));
    };
    serde_json::from_str(&text).map_err(|e| TransportError::Decode(e.to_string()))
}
