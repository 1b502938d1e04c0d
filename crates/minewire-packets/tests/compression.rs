mod common;

use bytes::BytesMut;
use minewire_packets::play::{BlockChange, PluginMessageClientbound};
use minewire_protocol_core::compression::decompress;
use minewire_protocol_core::*;
use minewire_types::{Identifier, Position};

fn split_frame(frame: &BytesMut) -> (usize, i32, BytesMut) {
    let mut cursor = frame.clone();
    let length = read_varint(&mut cursor).unwrap() as usize;
    assert_eq!(length, cursor.len());
    let data_length = read_varint(&mut cursor).unwrap();
    (length, data_length, cursor)
}

#[test]
fn threshold_64_small_and_large_packets() {
    let (mut client, mut server) = common::sessions(757, &PipelineConfig::default());
    common::offline_login(&mut client, &mut server, Some(64));
    assert_eq!(client.compression_threshold(), Some(64));

    // id (1) + position (8) + block id (1) = 10 bytes
    let small = BlockChange {
        position: Position::new(1, 64, -1),
        block_id: 9,
    };
    let frame = server.send(&small).unwrap();
    let (_, data_length, rest) = split_frame(&frame);
    assert_eq!(data_length, 0);
    assert_eq!(rest.len(), 10);
    assert_eq!(rest[0], 0x0C);

    // id (1) + channel (16) + data (183) = 200 bytes
    let large = PluginMessageClientbound {
        channel: Identifier::minecraft("brand"),
        data: vec![b'x'; 183],
    };
    let frame_large = server.send(&large).unwrap();
    let (_, data_length, rest) = split_frame(&frame_large);
    assert_eq!(data_length, 200);
    assert!(rest.len() < 200);
    let inflated = decompress(&rest, 200).unwrap();
    assert_eq!(inflated.len(), 200);
    assert_eq!(inflated[0], 0x18);

    let mut wire = frame;
    wire.extend_from_slice(&frame_large);
    let packets = client.feed(&wire).unwrap();
    assert_eq!(packets[0].downcast_ref::<BlockChange>(), Some(&small));
    assert_eq!(packets[1].downcast_ref::<PluginMessageClientbound>(), Some(&large));
}

#[test]
fn compressed_frames_fed_byte_by_byte() {
    let (mut client, mut server) = common::sessions(757, &PipelineConfig::default());
    common::offline_login(&mut client, &mut server, Some(0));

    let packet = PluginMessageClientbound {
        channel: Identifier::minecraft("brand"),
        data: b"vanilla".to_vec(),
    };
    let frame = server.send(&packet).unwrap();

    let mut received = Vec::new();
    for (i, byte) in frame.iter().enumerate() {
        let packets = client.feed(&[*byte]).unwrap();
        if i + 1 < frame.len() {
            assert!(packets.is_empty());
        }
        received.extend(packets);
    }
    assert_eq!(received.len(), 1);
    assert_eq!(
        received[0].downcast_ref::<PluginMessageClientbound>(),
        Some(&packet)
    );
}

#[test]
fn negative_threshold_keeps_plain_layout() {
    let (mut client, mut server) = common::sessions(757, &PipelineConfig::default());
    common::offline_login(&mut client, &mut server, Some(-1));
    assert_eq!(client.compression_threshold(), None);

    let frame = server
        .send(&BlockChange {
            position: Position::new(0, 0, 0),
            block_id: 1,
        })
        .unwrap();
    assert_eq!(frame[0] as usize, frame.len() - 1);
    assert_eq!(frame[1], 0x0C);
}

#[test]
fn oversized_declared_length_is_rejected() {
    let config = PipelineConfig {
        max_uncompressed_length: 1024,
        ..PipelineConfig::default()
    };
    let (mut client, mut server) = common::sessions(757, &config);
    common::offline_login(&mut client, &mut server, Some(64));

    // Server with a larger limit than the client.
    let (_, mut big_server) = common::sessions(757, &PipelineConfig::default());
    let (mut c, _) = common::sessions(757, &PipelineConfig::default());
    common::offline_login(&mut c, &mut big_server, Some(64));
    let frame = big_server
        .send(&PluginMessageClientbound {
            channel: Identifier::minecraft("brand"),
            data: vec![0; 4096],
        })
        .unwrap();

    let err = client.feed(&frame).unwrap_err();
    assert!(matches!(err, ProtocolError::BadCompression(_)));
    assert!(err.is_fatal());
}
