// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

use super::*;
use crate::config::ProviderConfig;
use crate::context::OpContext;
use crate::k3d::InMemoryK3d;
use crate::provider::{K3dProvider, ProviderContext};
use serde_json::json;

fn handler() -> Arc<ProviderHandler> {
    let k3d = Arc::new(InMemoryK3d::new());
    let provider = K3dProvider::new(ProviderContext::with_client(k3d, ProviderConfig::default()));
    Arc::new(ProviderHandler::new(Arc::new(provider), OpContext::new()))
}

async fn send<W: AsyncWrite + Unpin>(writer: &mut W, id: u64, message: Message) {
    let bytes = encode_message(&Envelope::new(RequestId(id), message)).unwrap();
    write_frame(writer, &bytes).await.unwrap();
}

async fn recv<R: AsyncRead + Unpin>(reader: &mut R) -> Envelope {
    decode_message(&read_frame(reader).await.unwrap()).unwrap()
}

#[tokio::test]
async fn test_frame_roundtrip() {
    let (mut a, mut b) = tokio::io::duplex(1024);
    write_frame(&mut a, b"hello").await.unwrap();
    assert_eq!(read_frame(&mut b).await.unwrap(), b"hello");
}

#[tokio::test]
async fn test_read_frame_rejects_oversized_length() {
    let (mut a, mut b) = tokio::io::duplex(64);
    let len = (MAX_MESSAGE_SIZE as u32 + 1).to_le_bytes();
    a.write_all(&len).await.unwrap();
    assert!(matches!(
        read_frame(&mut b).await,
        Err(ServerError::FrameTooLarge { .. })
    ));
}

#[tokio::test]
async fn test_serve_until_stop() {
    let (client, server) = tokio::io::duplex(1 << 20);
    let (server_read, server_write) = tokio::io::split(server);
    let (mut client_read, mut client_write) = tokio::io::split(client);
    let handler = handler();
    let server = tokio::spawn(serve(server_read, server_write, handler.clone()));

    send(&mut client_write, 1, Message::Handshake { protocol_version: None }).await;
    assert!(matches!(recv(&mut client_read).await.message, Message::HandshakeAck { .. }));

    send(
        &mut client_write,
        2,
        Message::ValidateResourceConfig {
            type_name: "k3d_cluster".into(),
            config: json!({ "name": "dev" }),
        },
    )
    .await;
    let response = recv(&mut client_read).await;
    assert_eq!(response.id, RequestId(2));
    assert!(matches!(response.message, Message::ValidateResponse { .. }));

    send(&mut client_write, 3, Message::Stop).await;
    let response = recv(&mut client_read).await;
    assert_eq!(response.message, Message::StopAck);

    server.await.unwrap().unwrap();
    assert!(handler.context().is_cancelled());
}

#[tokio::test]
async fn test_serve_ends_on_eof() {
    let (client, server) = tokio::io::duplex(1024);
    let (server_read, server_write) = tokio::io::split(server);
    let server = tokio::spawn(serve(server_read, server_write, handler()));
    drop(client);
    server.await.unwrap().unwrap();
}
