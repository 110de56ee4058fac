/// Terminal relay: bridges one client connection to one remote shell
use std::collections::HashMap;
use std::sync::Arc;

use tokio::select;
use tracing::{debug, error, info, warn};

use crate::config::TerminalConfig;
use crate::protocol::TerminalConnection;
use crate::pty::{PtyConfig, ShellConnector};
use crate::remote::ConnectParams;
use crate::service::message_handler::{Inbound, classify};
use crate::service::terminal_session::TerminalSession;
use crate::service::{RelayError, RelayResult};

const DEFAULT_PORT: &str = "22";

/// Lifecycle of a relay; `Closed` is final
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Connecting,
    Streaming,
    Closed,
}

/// Why the streaming loop stopped
#[derive(Debug)]
enum StopReason {
    ClientClosed,
    RemoteClosed,
    Failed(RelayError),
}

/// Read `host`, `port`, `username` and `password` from the query string.
///
/// Empty values count as missing. The port defaults to 22.
pub fn connect_params(query: &HashMap<String, String>) -> RelayResult<ConnectParams> {
    let present = |name: &str| query.get(name).filter(|v| !v.is_empty()).cloned();
    let (Some(host), Some(username), Some(password)) =
        (present("host"), present("username"), present("password"))
    else {
        return Err(RelayError::MissingParameters);
    };
    let port_text = present("port").unwrap_or_else(|| DEFAULT_PORT.to_string());
    let port = port_text
        .trim()
        .parse::<u16>()
        .map_err(|_| RelayError::InvalidPort(port_text.clone()))?;
    Ok(ConnectParams {
        host,
        port,
        username,
        password,
    })
}

/// Handle a terminal session using the TerminalConnection trait
pub async fn handle_terminal_session(
    mut connection: impl TerminalConnection,
    query: HashMap<String, String>,
    connector: Arc<dyn ShellConnector>,
    config: TerminalConfig,
) -> RelayState {
    let conn_id = connection.id().to_string();
    info!("New terminal connection: {}", conn_id);

    let mut state = RelayState::Connecting;
    debug!("Relay {} state {:?}", conn_id, state);

    let mut session = match open_session(&query, connector.as_ref(), &config).await {
        Ok(session) => session,
        Err(e) => {
            error!("Terminal connection {} failed: {}", conn_id, e);
            let _ = connection.send_text(&format!("ERROR: {}", e)).await;
            if let Err(e) = connection.close().await {
                debug!("Failed to close connection {}: {}", conn_id, e);
            }
            return RelayState::Closed;
        }
    };

    if let Err(e) = connection.send_text("Connected to SSH server").await {
        error!("Failed to greet connection {}: {}", conn_id, e);
        session.close().await;
        return RelayState::Closed;
    }
    state = RelayState::Streaming;
    info!(
        "Relay {} streaming with terminal size {:?}",
        conn_id,
        session.size()
    );

    let reason = stream(&mut connection, &mut session, config.read_chunk_size.max(1)).await;
    match &reason {
        StopReason::ClientClosed => info!("Connection closed by client for session {}", conn_id),
        StopReason::RemoteClosed => info!("SSH channel closed for session {}", conn_id),
        StopReason::Failed(e) => {
            error!("Relay {} failed: {}", conn_id, e);
            if !matches!(e, RelayError::Connection(_)) {
                let _ = connection.send_text(&format!("ERROR: {}", e)).await;
            }
        }
    }

    // Clean up resources
    info!("Cleaning up session {} from state {:?}", conn_id, state);
    session.close().await;
    if let Err(e) = connection.close().await {
        debug!("Failed to close connection {}: {}", conn_id, e);
    }

    info!("Terminal session {} closed", conn_id);
    RelayState::Closed
}

async fn open_session(
    query: &HashMap<String, String>,
    connector: &dyn ShellConnector,
    config: &TerminalConfig,
) -> RelayResult<TerminalSession> {
    let params = connect_params(query)?;
    let pty = PtyConfig {
        term: config.term.clone(),
        cols: config.size.columns,
        rows: config.size.rows,
    };
    info!(
        "Attempting SSH connection to {}:{} as {} via {}",
        params.host,
        params.port,
        params.username,
        connector.name()
    );
    let shell = connector
        .connect(&params, &pty)
        .await
        .map_err(RelayError::Connect)?;
    Ok(TerminalSession::new(shell, pty.cols, pty.rows))
}

/// Main session loop, handling client messages and shell output
async fn stream(
    connection: &mut impl TerminalConnection,
    session: &mut TerminalSession,
    chunk_size: usize,
) -> StopReason {
    loop {
        select! {
            msg_result = connection.receive() => {
                let message = match msg_result {
                    Some(Ok(message)) => message,
                    Some(Err(e)) => return StopReason::Failed(e.into()),
                    None => return StopReason::ClientClosed,
                };
                match classify(message) {
                    Inbound::Resize { cols, rows } => {
                        if let Err(e) = session.apply_resize(cols, rows).await {
                            warn!("Resize to {}x{} failed: {}", cols, rows, e);
                        }
                    }
                    Inbound::Input(bytes) => {
                        if let Err(e) = session.shell_mut().write(&bytes).await {
                            return StopReason::Failed(e.into());
                        }
                    }
                    Inbound::Close => return StopReason::ClientClosed,
                    Inbound::Ignore => {}
                }
            },
            output = session.shell_mut().read() => {
                let data = match output {
                    Ok(Some(data)) => data,
                    Ok(None) => return StopReason::RemoteClosed,
                    Err(e) => return StopReason::Failed(e.into()),
                };
                for chunk in data.chunks(chunk_size) {
                    if let Err(e) = connection.send_binary(chunk).await {
                        return StopReason::Failed(e.into());
                    }
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::TerminalMessage;
    use crate::protocol::mock_connection::{MockConnection, Outbound};
    use crate::pty::mock_pty::{MockConnector, MockShell};

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn full_query() -> HashMap<String, String> {
        query(&[
            ("host", "10.0.0.5"),
            ("port", "2222"),
            ("username", "alice"),
            ("password", "secret"),
        ])
    }

    #[test]
    fn test_connect_params_default_port() {
        let params = connect_params(&query(&[
            ("host", "h"),
            ("username", "u"),
            ("password", "p"),
        ]))
        .unwrap();
        assert_eq!(params.port, 22);
        assert_eq!(connect_params(&full_query()).unwrap().port, 2222);
    }

    #[test]
    fn test_connect_params_rejects_bad_port() {
        let mut q = full_query();
        q.insert("port".into(), "ssh".into());
        assert!(matches!(connect_params(&q), Err(RelayError::InvalidPort(_))));
    }

    #[tokio::test]
    async fn test_missing_password_never_authenticates() {
        let connector = Arc::new(MockConnector::refusing());
        let (connection, mut client) = MockConnection::new("c1");
        let mut q = full_query();
        q.remove("password");

        let state =
            handle_terminal_session(connection, q, connector.clone(), TerminalConfig::default())
                .await;

        assert_eq!(state, RelayState::Closed);
        assert_eq!(connector.calls(), 0);
        assert_eq!(
            client.drain(),
            vec![
                Outbound::Text(
                    "ERROR: Missing connection parameters. Need host, username, and password."
                        .into()
                ),
                Outbound::Close,
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_login_reports_error() {
        let connector = Arc::new(MockConnector::refusing());
        let (connection, mut client) = MockConnection::new("c2");

        handle_terminal_session(connection, full_query(), connector.clone(), TerminalConfig::default())
            .await;

        assert_eq!(connector.calls(), 1);
        let sent = client.drain();
        assert!(matches!(&sent[0], Outbound::Text(t) if t.starts_with("ERROR: Failed to connect: ")));
        assert_eq!(sent.last(), Some(&Outbound::Close));
    }

    #[tokio::test]
    async fn test_relay_forwards_input_and_consumes_resizes() {
        let (shell, output, probe) = MockShell::new();
        let connector = Arc::new(MockConnector::with_shell(shell));
        let (connection, mut client) = MockConnection::new("c3");

        let task = tokio::spawn(handle_terminal_session(
            connection,
            full_query(),
            connector.clone(),
            TerminalConfig::default(),
        ));

        client.send_text("ls -la\n");
        client.send_text(r#"{"type":"resize","cols":120,"rows":40}"#);
        client.send_text("\x1b[8;40;120t");
        client.send_text(r#"{"type":"resize","cols":5,"rows":40}"#);
        client.send_text(r#"{"type":"resize","cols":"x"}"#);
        client
            .to_relay
            .send(TerminalMessage::Binary(vec![0x03]))
            .unwrap();
        client.to_relay.send(TerminalMessage::Close).unwrap();

        assert_eq!(task.await.unwrap(), RelayState::Closed);
        drop(output);

        let (params, pty) = connector.requested().unwrap();
        assert_eq!(params.port, 2222);
        assert_eq!(pty.term, "xterm-256color");
        assert_eq!((pty.cols, pty.rows), (100, 24));

        let mut expected = b"ls -la\n".to_vec();
        expected.extend_from_slice(br#"{"type":"resize","cols":"x"}"#);
        expected.push(0x03);
        assert_eq!(probe.written(), expected);
        assert_eq!(probe.sizes(), vec![(120, 40), (120, 40)]);
        assert!(probe.is_closed());

        let sent = client.drain();
        assert_eq!(sent.first(), Some(&Outbound::Text("Connected to SSH server".into())));
        assert_eq!(sent.last(), Some(&Outbound::Close));
    }

    #[tokio::test]
    async fn test_out_of_range_escape_resize_is_consumed() {
        let (shell, output, probe) = MockShell::new();
        let connector = Arc::new(MockConnector::with_shell(shell));
        let (connection, mut client) = MockConnection::new("c5");

        let task = tokio::spawn(handle_terminal_session(
            connection,
            full_query(),
            connector,
            TerminalConfig::default(),
        ));

        client.send_text("\x1b[8;2;5t");
        client.send_text("\x1b[8;201;80t");
        client.send_text("pwd\n");
        client.to_relay.send(TerminalMessage::Close).unwrap();

        assert_eq!(task.await.unwrap(), RelayState::Closed);
        drop(output);

        assert_eq!(probe.written(), b"pwd\n".to_vec());
        assert!(probe.sizes().is_empty());
        assert!(
            !client
                .drain()
                .iter()
                .any(|m| matches!(m, Outbound::Text(t) if t.starts_with("ERROR")))
        );
    }

    #[tokio::test]
    async fn test_output_is_chunked() {
        let (shell, output, probe) = MockShell::new();
        let connector = Arc::new(MockConnector::with_shell(shell));
        let (connection, mut client) = MockConnection::new("c4");

        output.send(vec![b'x'; 10_000]).unwrap();
        drop(output);

        let state = handle_terminal_session(
            connection,
            full_query(),
            connector,
            TerminalConfig::default(),
        )
        .await;

        assert_eq!(state, RelayState::Closed);
        assert!(probe.is_closed());
        let sizes: Vec<usize> = client
            .drain()
            .into_iter()
            .filter_map(|m| match m {
                Outbound::Binary(data) => Some(data.len()),
                _ => None,
            })
            .collect();
        assert_eq!(sizes, vec![4096, 4096, 1808]);
    }
}
