#![allow(dead_code)]

use minewire_packets::handshaking::Handshake;
use minewire_packets::login::{LoginStart, LoginSuccess, SetCompression};
use minewire_protocol_core::{ConnectionSession, ConnectionState, PipelineConfig, Side};
use uuid::Uuid;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

pub fn sessions(version: i32, config: &PipelineConfig) -> (ConnectionSession, ConnectionSession) {
    init_tracing();
    let registry = minewire_packets::registry();
    (
        ConnectionSession::new(Side::Client, registry.clone(), version, config).unwrap(),
        ConnectionSession::new(Side::Server, registry, version, config).unwrap(),
    )
}

/// Offline-mode login (no encryption) up to Play, with an optional
/// compression threshold.
pub fn offline_login(
    client: &mut ConnectionSession,
    server: &mut ConnectionSession,
    threshold: Option<i32>,
) {
    let version = client.protocol_version();
    let mut wire = client
        .send(&Handshake::new(version, "localhost", 25565, ConnectionState::Login))
        .unwrap();
    wire.extend_from_slice(
        &client
            .send(&LoginStart {
                username: "Steve".into(),
            })
            .unwrap(),
    );
    let received = server.feed(&wire).unwrap();
    assert_eq!(received.len(), 2);
    assert!(received[1].is::<LoginStart>());

    let mut wire = bytes::BytesMut::new();
    if let Some(threshold) = threshold {
        wire.extend_from_slice(&server.send(&SetCompression { threshold }).unwrap());
    }
    wire.extend_from_slice(
        &server
            .send(&LoginSuccess {
                uuid: Uuid::from_u128(1),
                username: "Steve".into(),
            })
            .unwrap(),
    );
    client.feed(&wire).unwrap();
    assert_eq!(client.state(), ConnectionState::Play);
    assert_eq!(server.state(), ConnectionState::Play);
}
