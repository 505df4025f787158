//! TCP acceptor and per-user submission framing.

use {
    crate::frame::Framer,
    crossbeam_channel::{unbounded, Receiver, Sender},
    log::*,
    std::{
        collections::HashMap,
        io::{ErrorKind, Read},
        net::{Shutdown, SocketAddr, TcpListener, TcpStream},
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc, Mutex,
        },
        thread::{sleep, Builder, JoinHandle},
        time::Duration,
    },
};

const ACCEPT_RETRY_SLEEP: Duration = Duration::from_millis(10);
const USER_READ_TIMEOUT: Duration = Duration::from_millis(250);

struct UserHandle {
    stream: TcpStream,
    thread: JoinHandle<()>,
}

type UserMap = Arc<Mutex<HashMap<u64, UserHandle>>>;

/// Listens for local submitters and forwards every well-framed payload
/// through the submission channel in arrival order.
///
/// Users live in a registry owned by the server; a reader thread that
/// finishes (peer close, read error, protocol violation) shuts its
/// socket down and enqueues its id, and `reap` removes and joins it
/// between service-loop iterations. Nothing frees a user while its
/// thread may still run.
pub struct TcpServer {
    local_addr: SocketAddr,
    accept_thread: Option<JoinHandle<()>>,
    users: UserMap,
    done_rx: Receiver<u64>,
    exit: Arc<AtomicBool>,
}

impl TcpServer {
    pub fn bind(
        port: u16,
        submit_tx: Sender<Vec<u8>>,
        exit: Arc<AtomicBool>,
    ) -> std::io::Result<Self> {
        let listener = TcpListener::bind(("0.0.0.0", port))?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;
        let (done_tx, done_rx) = unbounded();
        let users: UserMap = Arc::new(Mutex::new(HashMap::new()));

        let accept_thread = {
            let users = users.clone();
            let exit = exit.clone();
            Builder::new()
                .name("txProxyAccept".to_string())
                .spawn(move || accept_loop(listener, submit_tx, done_tx, users, exit))
                .unwrap()
        };

        Ok(Self {
            local_addr,
            accept_thread: Some(accept_thread),
            users,
            done_rx,
            exit,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn open_users(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    /// The acceptor only stops on exit or a fatal listener error.
    pub fn is_listening(&self) -> bool {
        self.accept_thread
            .as_ref()
            .map(|thread| !thread.is_finished())
            .unwrap_or(false)
    }

    /// Remove and join users whose reader threads have finished.
    pub fn reap(&mut self) {
        while let Ok(id) = self.done_rx.try_recv() {
            if let Some(user) = self.users.lock().unwrap().remove(&id) {
                debug!("delete user {}", id);
                let _ = user.thread.join();
            }
        }
    }

    /// Close the listener and every open user deterministically.
    pub fn shutdown(&mut self) {
        self.exit.store(true, Ordering::Relaxed);
        if let Some(thread) = self.accept_thread.take() {
            let _ = thread.join();
        }
        let users: Vec<_> = {
            let mut users = self.users.lock().unwrap();
            users.drain().collect()
        };
        for (id, user) in users {
            debug!("closing user {}", id);
            let _ = user.stream.shutdown(Shutdown::Both);
            let _ = user.thread.join();
        }
    }
}

impl Drop for TcpServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn accept_loop(
    listener: TcpListener,
    submit_tx: Sender<Vec<u8>>,
    done_tx: Sender<u64>,
    users: UserMap,
    exit: Arc<AtomicBool>,
) {
    let mut next_id: u64 = 0;
    while !exit.load(Ordering::Relaxed) {
        match listener.accept() {
            Ok((stream, peer_addr)) => {
                next_id += 1;
                let id = next_id;
                debug!("new user {} from {}", id, peer_addr);
                // accepted sockets may inherit the listener's
                // nonblocking mode on some platforms
                if let Err(err) = stream
                    .set_nonblocking(false)
                    .and_then(|()| stream.set_read_timeout(Some(USER_READ_TIMEOUT)))
                {
                    warn!("user {}: set_read_timeout failed: {}", id, err);
                    continue;
                }
                let reader_stream = match stream.try_clone() {
                    Ok(stream) => stream,
                    Err(err) => {
                        warn!("user {}: clone failed: {}", id, err);
                        continue;
                    }
                };
                let thread = {
                    let submit_tx = submit_tx.clone();
                    let done_tx = done_tx.clone();
                    let exit = exit.clone();
                    Builder::new()
                        .name(format!("txProxyUser{:02}", id % 100))
                        .spawn(move || user_loop(id, reader_stream, submit_tx, done_tx, exit))
                        .unwrap()
                };
                users.lock().unwrap().insert(id, UserHandle { stream, thread });
            }
            Err(err) if err.kind() == ErrorKind::WouldBlock => sleep(ACCEPT_RETRY_SLEEP),
            Err(err) => {
                error!("listener accept failed: {}", err);
                break;
            }
        }
    }
}

fn user_loop(
    id: u64,
    mut stream: TcpStream,
    submit_tx: Sender<Vec<u8>>,
    done_tx: Sender<u64>,
    exit: Arc<AtomicBool>,
) {
    let mut framer = Framer::default();
    let mut chunk = [0u8; 4096];
    'read: while !exit.load(Ordering::Relaxed) {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(nread) => {
                framer.feed(&chunk[..nread]);
                loop {
                    match framer.next_frame() {
                        Ok(Some(payload)) => {
                            if submit_tx.send(payload).is_err() {
                                break 'read;
                            }
                        }
                        Ok(None) => break,
                        Err(err) => {
                            warn!("user {}: {}, tearing down", id, err);
                            break 'read;
                        }
                    }
                }
            }
            Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            Err(err) => {
                debug!("user {} read error: {}", id, err);
                break;
            }
        }
    }
    let _ = stream.shutdown(Shutdown::Both);
    let _ = done_tx.send(id);
}
