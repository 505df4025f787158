//! WebSocket JSON-RPC subscription client for slot notifications.

use {
    crate::rpc_response::SlotInfo,
    crossbeam_channel::{unbounded, Receiver},
    log::*,
    serde_json::{
        json,
        value::Value::{Number, Object},
        Map, Value,
    },
    std::{
        net::TcpStream,
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc, RwLock,
        },
        thread::JoinHandle,
    },
    thiserror::Error,
    tungstenite::{connect, stream::MaybeTlsStream, Message, WebSocket},
    url::{ParseError, Url},
};

#[derive(Debug, Error)]
pub enum PubsubClientError {
    #[error("url parse error")]
    UrlParseError(#[from] ParseError),

    #[error("unable to connect to server")]
    ConnectionError(#[from] tungstenite::Error),

    #[error("json parse error")]
    JsonParseError(#[from] serde_json::error::Error),

    #[error("unexpected message format: {0}")]
    UnexpectedMessageError(String),
}

type WsSocket = Arc<RwLock<WebSocket<MaybeTlsStream<TcpStream>>>>;

/// Handle for one live `slotSubscribe` stream. Dropping it unsubscribes
/// and closes the socket, which also unblocks the reader thread.
pub struct SlotsSubscription {
    socket: WsSocket,
    subscription_id: u64,
    t_reader: Option<JoinHandle<()>>,
    exit: Arc<AtomicBool>,
}

impl Drop for SlotsSubscription {
    fn drop(&mut self) {
        self.send_unsubscribe()
            .unwrap_or_else(|_| warn!("unable to unsubscribe from websocket"));
        self.socket
            .write()
            .unwrap()
            .close(None)
            .unwrap_or_else(|_| warn!("unable to close websocket"));
    }
}

impl SlotsSubscription {
    pub fn send_unsubscribe(&self) -> Result<(), PubsubClientError> {
        self.socket
            .write()
            .unwrap()
            .write_message(Message::Text(
                json!({
                    "jsonrpc":"2.0","id":1,"method":"slotUnsubscribe","params":[self.subscription_id]
                })
                .to_string(),
            ))
            .map_err(|err| err.into())
    }

    pub fn shutdown(&mut self) -> std::thread::Result<()> {
        if self.t_reader.is_some() {
            debug!("websocket thread - shutting down");
            self.exit.store(true, Ordering::Relaxed);
            let result = self.t_reader.take().unwrap().join();
            debug!("websocket thread - shut down.");
            result
        } else {
            warn!("websocket thread - already shut down.");
            Ok(())
        }
    }
}

pub struct PubsubClient {}

impl PubsubClient {
    /// Open a WebSocket to `url`, issue `slotSubscribe`, and stream the
    /// notifications through the returned channel. The channel
    /// disconnects when the socket errors or closes.
    pub fn slot_subscribe(
        url: &str,
    ) -> Result<(SlotsSubscription, Receiver<SlotInfo>), PubsubClientError> {
        let url = Url::parse(url)?;
        let socket = connect(url).map(|(socket, _)| socket)?;
        let (sender, receiver) = unbounded::<SlotInfo>();

        let socket = Arc::new(RwLock::new(socket));
        let socket_clone = socket.clone();
        let exit = Arc::new(AtomicBool::new(false));
        let exit_clone = exit.clone();
        let subscription_id = Self::send_subscribe(
            &socket_clone,
            json!({
                "jsonrpc":"2.0","id":1,"method":"slotSubscribe","params":[]
            })
            .to_string(),
        )?;

        let t_reader = std::thread::Builder::new()
            .name("txProxySlotSub".to_string())
            .spawn(move || {
                loop {
                    if exit_clone.load(Ordering::Relaxed) {
                        break;
                    }
                    match Self::read_message(&socket_clone) {
                        Ok(message) => {
                            if sender.send(message).is_err() {
                                break;
                            }
                        }
                        Err(err) => {
                            info!("receive error: {:?}", err);
                            break;
                        }
                    }
                }

                info!("websocket - exited receive loop");
            })
            .unwrap();

        Ok((
            SlotsSubscription {
                socket,
                subscription_id,
                t_reader: Some(t_reader),
                exit,
            },
            receiver,
        ))
    }

    fn send_subscribe(writable_socket: &WsSocket, body: String) -> Result<u64, PubsubClientError> {
        writable_socket
            .write()
            .unwrap()
            .write_message(Message::Text(body))?;
        let message = writable_socket.write().unwrap().read_message()?;
        Self::extract_subscription_id(message)
    }

    fn extract_subscription_id(message: Message) -> Result<u64, PubsubClientError> {
        let message_text = &message.into_text()?;
        let json_msg: Map<String, Value> = serde_json::from_str(message_text)?;

        if let Some(Number(x)) = json_msg.get("result") {
            if let Some(x) = x.as_u64() {
                return Ok(x);
            }
        }
        Err(PubsubClientError::UnexpectedMessageError(format!(
            "{:?}",
            json_msg
        )))
    }

    fn read_message(writable_socket: &WsSocket) -> Result<SlotInfo, PubsubClientError> {
        let message = writable_socket.write().unwrap().read_message()?;
        let message_text = &message.into_text()?;
        let json_msg: Map<String, Value> = serde_json::from_str(message_text)?;

        if let Some(Object(params)) = json_msg.get("params") {
            if let Some(result) = params.get("result") {
                return serde_json::from_value::<SlotInfo>(result.clone()).map_err(|err| err.into());
            }
        }

        Err(PubsubClientError::UnexpectedMessageError(format!(
            "{:?}",
            json_msg
        )))
    }
}
