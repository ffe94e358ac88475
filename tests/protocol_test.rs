// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

//! Framed protocol session tests.
//!
//! A host talks to the provider over an in-process pipe using the same
//! length-prefixed frames it would exchange over stdio.

use std::sync::Arc;

use k3d_provider::ipc::{
    decode_message, encode_message, error_codes, read_frame, serve, write_frame, Envelope, Message,
    ProviderHandler, RequestId,
};
use k3d_provider::k3d::InMemoryK3d;
use k3d_provider::{DiagnosticCode, K3dProvider, OpContext, ProviderConfig, ProviderContext};
use serde_json::json;
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio::io::DuplexStream;
use tokio::task::JoinHandle;
use tokio_test::assert_ok;

struct Session {
    reader: ReadHalf<DuplexStream>,
    writer: WriteHalf<DuplexStream>,
    server: JoinHandle<Result<(), k3d_provider::ipc::ServerError>>,
    handler: Arc<ProviderHandler>,
    k3d: Arc<InMemoryK3d>,
    next_id: u64,
    _dir: tempfile::TempDir,
}

impl Session {
    fn start() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let k3d = Arc::new(InMemoryK3d::new());
        let config = ProviderConfig {
            config_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let provider = K3dProvider::new(ProviderContext::with_client(k3d.clone(), config));
        let handler = Arc::new(ProviderHandler::new(Arc::new(provider), OpContext::new()));

        let (client, server) = tokio::io::duplex(1 << 20);
        let (server_read, server_write) = tokio::io::split(server);
        let (reader, writer) = tokio::io::split(client);
        let server = tokio::spawn(serve(server_read, server_write, handler.clone()));

        Self {
            reader,
            writer,
            server,
            handler,
            k3d,
            next_id: 1,
            _dir: dir,
        }
    }

    async fn call(&mut self, message: Message) -> Message {
        let id = RequestId(self.next_id);
        self.next_id += 1;
        send(&mut self.writer, Envelope::new(id, message)).await;
        let response = recv(&mut self.reader).await;
        assert_eq!(response.id, id);
        response.message
    }
}

async fn send<W: AsyncWrite + Unpin>(writer: &mut W, envelope: Envelope) {
    let bytes = assert_ok!(encode_message(&envelope));
    assert_ok!(write_frame(writer, &bytes).await);
}

async fn recv<R: AsyncRead + Unpin>(reader: &mut R) -> Envelope {
    let frame = assert_ok!(read_frame(reader).await);
    assert_ok!(decode_message(&frame))
}

/// The full host workflow: handshake, configure, plan, apply, read nodes,
/// destroy, stop.
#[tokio::test]
async fn test_full_session() {
    let mut session = Session::start();

    match session.call(Message::Handshake { protocol_version: None }).await {
        Message::HandshakeAck { provider, .. } => {
            assert_eq!(provider.resources, vec!["k3d_cluster".to_string()]);
            assert_eq!(provider.data_sources, vec!["k3d_nodes".to_string()]);
        }
        other => panic!("unexpected response {:?}", other),
    }

    match session.call(Message::Configure { config: json!({}) }).await {
        Message::ConfigureResponse { diagnostics } => assert!(diagnostics.is_empty()),
        other => panic!("unexpected response {:?}", other),
    }

    let planned = match session
        .call(Message::PlanResourceChange {
            type_name: "k3d_cluster".into(),
            prior_state: None,
            config: Some(json!({ "name": "dev", "servers": 1, "agents": 2 })),
        })
        .await
    {
        Message::PlanResponse {
            planned_state: Some(planned),
            ..
        } => planned,
        other => panic!("unexpected response {:?}", other),
    };

    let state = match session
        .call(Message::ApplyResourceChange {
            type_name: "k3d_cluster".into(),
            prior_state: None,
            planned_state: Some(planned),
        })
        .await
    {
        Message::ApplyResponse {
            new_state: Some(state),
            diagnostics,
        } => {
            assert!(!diagnostics.has_error(), "{:?}", diagnostics);
            state
        }
        other => panic!("unexpected response {:?}", other),
    };
    assert_eq!(state["id"], json!("dev"));
    assert_eq!(state["network"], json!("k3d-dev"));

    match session
        .call(Message::ReadDataSource {
            type_name: "k3d_nodes".into(),
            config: json!({ "cluster_name": "dev" }),
        })
        .await
    {
        Message::ReadDataSourceResponse {
            state: Some(nodes),
            ..
        } => {
            // one server, two agents and the load balancer
            assert_eq!(nodes["nodes"].as_object().unwrap().len(), 4);
        }
        other => panic!("unexpected response {:?}", other),
    }

    match session
        .call(Message::ApplyResourceChange {
            type_name: "k3d_cluster".into(),
            prior_state: Some(state),
            planned_state: None,
        })
        .await
    {
        Message::ApplyResponse { new_state, diagnostics } => {
            assert!(new_state.is_none());
            assert!(diagnostics.is_empty());
        }
        other => panic!("unexpected response {:?}", other),
    }
    assert!(session.k3d.cluster_names().is_empty());

    assert_eq!(session.call(Message::Stop).await, Message::StopAck);
    assert_ok!(session.server.await.unwrap());
    assert!(session.handler.context().is_cancelled());
}

/// Requests before the handshake are refused, but the session survives.
#[tokio::test]
async fn test_handshake_gate() {
    let mut session = Session::start();

    let response = session.call(Message::GetMetadata).await;
    assert!(matches!(
        response,
        Message::Error {
            code: error_codes::HANDSHAKE_REQUIRED,
            ..
        }
    ));

    assert!(matches!(
        session.call(Message::Handshake { protocol_version: None }).await,
        Message::HandshakeAck { .. }
    ));
    assert!(matches!(
        session.call(Message::GetMetadata).await,
        Message::MetadataResponse(_)
    ));
}

/// Invalid configuration comes back as attribute diagnostics, not an error frame.
#[tokio::test]
async fn test_validation_diagnostics() {
    let mut session = Session::start();
    session.call(Message::Handshake { protocol_version: None }).await;

    match session
        .call(Message::ValidateResourceConfig {
            type_name: "k3d_cluster".into(),
            config: json!({ "name": "dev", "k8s_api_host_port": 70000 }),
        })
        .await
    {
        Message::ValidateResponse { diagnostics } => {
            assert_eq!(diagnostics.errors().count(), 1);
            assert!(diagnostics.has_code(DiagnosticCode::ValidationFailure));
        }
        other => panic!("unexpected response {:?}", other),
    }
}

/// A garbage frame gets a bad-request reply and the next frame still works.
#[tokio::test]
async fn test_malformed_frame_recovers() {
    let mut session = Session::start();

    assert_ok!(write_frame(&mut session.writer, b"{\"type\":\"launch\"}").await);
    let response = recv(&mut session.reader).await;
    assert_eq!(response.id, RequestId(0));
    assert!(matches!(
        response.message,
        Message::Error {
            code: error_codes::BAD_REQUEST,
            ..
        }
    ));

    assert!(matches!(
        session.call(Message::Handshake { protocol_version: None }).await,
        Message::HandshakeAck { .. }
    ));
}
