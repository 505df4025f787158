use {
    crossbeam_channel::unbounded,
    std::{
        io::{Read, Write},
        net::{SocketAddr, TcpStream, UdpSocket},
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc,
        },
        time::{Duration, Instant},
    },
    tpu_proxy::{
        embedded::EmbeddedTpu,
        frame::{encode_frame, TX_PROTO_ID},
        hash::Hash,
        mock_sender::PUBKEY,
        price_tx::{PriceCommand, PriceStatus, PriceUpdate},
        pubkey::Pubkey,
        rpc_client::RpcClient,
        rpc_control::RpcControl,
        rpc_response::RpcContactInfo,
        signature::{Keypair, Signature, SIGNATURE_BYTES},
        tcp_server::TcpServer,
    },
};

fn loopback(server: &TcpServer) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], server.local_addr().port()))
}

fn udp_receiver() -> (UdpSocket, SocketAddr) {
    let socket = UdpSocket::bind("127.0.0.1:0").expect("bind");
    socket
        .set_read_timeout(Some(Duration::from_secs(1)))
        .unwrap();
    let addr = socket.local_addr().unwrap();
    (socket, addr)
}

fn contact_info(pubkey: &Pubkey, tpu: SocketAddr) -> RpcContactInfo {
    RpcContactInfo {
        pubkey: pubkey.to_string(),
        gossip: None,
        tpu: Some(tpu),
        rpc: None,
    }
}

fn offline_embedded() -> EmbeddedTpu {
    let control =
        RpcControl::new_with_client(RpcClient::new_mock("fails".to_string()), String::new());
    EmbeddedTpu::new_with_control(control).unwrap()
}

fn price_update<'a>(
    publisher: &'a Keypair,
    price_account: &'a Pubkey,
    program: &'a Pubkey,
    blockhash: &'a Hash,
) -> PriceUpdate<'a> {
    PriceUpdate {
        publisher,
        price_account,
        program,
        blockhash,
        price: 42_000_000,
        conf: 12_345,
        status: PriceStatus::Trading,
        pub_slot: 100,
        command: PriceCommand::UpdPrice,
    }
}

#[test]
fn test_embedded_sprays_current_and_next_leader() {
    let (recv1, addr1) = udp_receiver();
    let (recv2, addr2) = udp_receiver();
    let k1 = Pubkey::new_from_array([1; 32]);
    let k2 = Pubkey::new_from_array([2; 32]);

    let mut tpu = offline_embedded();
    let nodes = vec![contact_info(&k1, addr1), contact_info(&k2, addr2)];
    tpu.tracker_mut()
        .set_cluster_nodes(tpu_proxy::cluster_nodes::ClusterNodes::from_contact_infos(
            &nodes,
        ));
    tpu.tracker_mut().set_schedule(100, vec![k1, k2]);
    tpu.record_slot(100);

    let publisher = Keypair::new();
    let price_account = Pubkey::new_from_array([11; 32]);
    let program = Pubkey::new_from_array([22; 32]);
    let blockhash = Hash::new_from_array([33; 32]);
    tpu.submit(&price_update(
        &publisher,
        &price_account,
        &program,
        &blockhash,
    ));

    let mut buf1 = [0u8; 1280];
    let n1 = recv1.recv(&mut buf1).expect("current leader packet");
    let mut buf2 = [0u8; 1280];
    let n2 = recv2.recv(&mut buf2).expect("next leader packet");
    assert_eq!(&buf1[..n1], &buf2[..n2]);

    // the bytes on the wire are a complete signed transaction
    let wire = &buf1[..n1];
    assert_eq!(wire[0], 1);
    let message_start = 1 + SIGNATURE_BYTES;
    let signature = Signature::new(&wire[1..message_start]);
    assert!(signature.verify(publisher.pubkey().as_ref(), &wire[message_start..]));
}

#[test]
fn test_embedded_suppresses_duplicate_leader() {
    let (recv1, addr1) = udp_receiver();
    let (recv2, addr2) = udp_receiver();
    let k1 = Pubkey::new_from_array([1; 32]);
    let k2 = Pubkey::new_from_array([2; 32]);

    let mut tpu = offline_embedded();
    let nodes = vec![contact_info(&k1, addr1), contact_info(&k2, addr2)];
    tpu.tracker_mut()
        .set_cluster_nodes(tpu_proxy::cluster_nodes::ClusterNodes::from_contact_infos(
            &nodes,
        ));
    tpu.tracker_mut().set_schedule(200, vec![k1, k1]);
    tpu.record_slot(200);

    let publisher = Keypair::new();
    let price_account = Pubkey::new_from_array([11; 32]);
    let program = Pubkey::new_from_array([22; 32]);
    let blockhash = Hash::new_from_array([33; 32]);
    tpu.submit(&price_update(
        &publisher,
        &price_account,
        &program,
        &blockhash,
    ));

    let mut buf = [0u8; 1280];
    recv1.recv(&mut buf).expect("current leader packet");
    recv1
        .set_read_timeout(Some(Duration::from_millis(200)))
        .unwrap();
    recv2
        .set_read_timeout(Some(Duration::from_millis(200)))
        .unwrap();
    assert!(recv1.recv(&mut buf).is_err(), "only one packet expected");
    assert!(recv2.recv(&mut buf).is_err(), "no next-leader packet");
}

#[test]
fn test_embedded_cold_start_drops_silently() {
    let mut tpu = offline_embedded();
    let publisher = Keypair::new();
    let price_account = Pubkey::new_from_array([11; 32]);
    let program = Pubkey::new_from_array([22; 32]);
    let blockhash = Hash::new_from_array([33; 32]);
    // no schedule, no nodes: nothing to send, nothing to fail
    tpu.submit(&price_update(
        &publisher,
        &price_account,
        &program,
        &blockhash,
    ));
}

#[test]
fn test_embedded_fetches_schedule_from_rpc() {
    let mocks = tpu_proxy::mock_sender::Mocks::from([(
        tpu_proxy::rpc_request::RpcRequest::GetSlotLeaders,
        serde_json::json!([PUBKEY, PUBKEY]),
    )]);
    let control = RpcControl::new_with_client(
        RpcClient::new_mock_with_mocks("succeeds".to_string(), mocks),
        String::new(),
    );
    let mut tpu = EmbeddedTpu::new_with_control(control).unwrap();

    // the first tick issues the initial fetch; the mock serves a window
    // anchored at that slot
    tpu.record_slot(500);
    let leader = PUBKEY.parse::<Pubkey>().unwrap();
    let (_recv, addr) = udp_receiver();
    tpu.tracker_mut()
        .set_cluster_nodes(tpu_proxy::cluster_nodes::ClusterNodes::from_contact_infos(
            &[contact_info(&leader, addr)],
        ));
    tpu.record_slot(501);
    assert_eq!(tpu.tracker().current_leader(), Some(addr));
    // both slots belong to the same validator
    assert_eq!(tpu.tracker().next_leader(), None);
}

#[test]
fn test_tcp_frames_reach_submission_channel() {
    let (submit_tx, submit_rx) = unbounded();
    let exit = Arc::new(AtomicBool::new(false));
    let mut server = TcpServer::bind(0, submit_tx, exit.clone()).unwrap();
    let addr = loopback(&server);

    let mut client = TcpStream::connect(addr).unwrap();
    let payload = vec![9u8; 200];
    client.write_all(&encode_frame(&payload)).unwrap();
    // a second frame on the same connection arrives in order
    client.write_all(&encode_frame(b"second")).unwrap();

    let first = submit_rx
        .recv_timeout(Duration::from_secs(2))
        .expect("first payload");
    assert_eq!(first, payload);
    let second = submit_rx
        .recv_timeout(Duration::from_secs(2))
        .expect("second payload");
    assert_eq!(second, b"second".to_vec());

    exit.store(true, Ordering::Relaxed);
    server.shutdown();
}

#[test]
fn test_tcp_protocol_violation_tears_down_user() {
    let (submit_tx, submit_rx) = unbounded();
    let exit = Arc::new(AtomicBool::new(false));
    let mut server = TcpServer::bind(0, submit_tx, exit.clone()).unwrap();
    let addr = loopback(&server);

    let mut client = TcpStream::connect(addr).unwrap();
    let mut bad_frame = encode_frame(&[1, 2, 3]);
    bad_frame[2] = 0xad;
    bad_frame[3] = 0xde;
    assert_ne!(u16::from_le_bytes([0xad, 0xde]), TX_PROTO_ID);
    client.write_all(&bad_frame).unwrap();

    // the server closes the connection; the client observes EOF
    client
        .set_read_timeout(Some(Duration::from_secs(2)))
        .unwrap();
    let mut buf = [0u8; 16];
    assert_eq!(client.read(&mut buf).unwrap(), 0);

    // the user is moved off the open list by the reap step
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        server.reap();
        if server.open_users() == 0 {
            break;
        }
        assert!(Instant::now() < deadline, "user never reaped");
        std::thread::sleep(Duration::from_millis(10));
    }

    // the hostile frame was never forwarded
    assert!(submit_rx.try_recv().is_err());

    exit.store(true, Ordering::Relaxed);
    server.shutdown();
}

#[test]
fn test_tcp_peer_close_reaps_user() {
    let (submit_tx, _submit_rx) = unbounded();
    let exit = Arc::new(AtomicBool::new(false));
    let mut server = TcpServer::bind(0, submit_tx, exit.clone()).unwrap();
    let addr = loopback(&server);

    let client = TcpStream::connect(addr).unwrap();
    let deadline = Instant::now() + Duration::from_secs(2);
    while server.open_users() == 0 {
        assert!(Instant::now() < deadline, "user never registered");
        std::thread::sleep(Duration::from_millis(10));
    }
    drop(client);

    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        server.reap();
        if server.open_users() == 0 {
            break;
        }
        assert!(Instant::now() < deadline, "user never reaped");
        std::thread::sleep(Duration::from_millis(10));
    }

    exit.store(true, Ordering::Relaxed);
    server.shutdown();
}
