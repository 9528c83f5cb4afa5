// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for handling socket I/O.
//!
//! The Listener runs in a spawned task, accepting connections and
//! handling each in its own task so a slow start never blocks other
//! clients.

use std::sync::Arc;
use std::time::Instant;

use bf_adapters::ProcessAdapter;
use bf_core::{Clock, LaunchRequest, Secret, TenantId, TenantStore};
use bf_supervisor::{SpawnError, Supervisor};
use thiserror::Error;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use crate::lifecycle::respawn_tenants;
use crate::protocol::{self, Request, Response, DEFAULT_TIMEOUT, PROTOCOL_VERSION};

/// Shared state every connection handler needs.
pub struct ListenCtx<P: ProcessAdapter, C: Clock> {
    pub supervisor: Arc<Supervisor<P, C>>,
    pub store: Arc<dyn TenantStore>,
    pub start_time: Instant,
    pub shutdown: Arc<Notify>,
}

/// Listener task for accepting socket connections.
pub struct Listener<P: ProcessAdapter, C: Clock> {
    socket: UnixListener,
    ctx: Arc<ListenCtx<P, C>>,
}

/// Errors from connection handling.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),
}

impl<P: ProcessAdapter, C: Clock> Listener<P, C> {
    pub fn new(socket: UnixListener, ctx: ListenCtx<P, C>) -> Self {
        Self {
            socket,
            ctx: Arc::new(ctx),
        }
    }

    /// Run the listener loop, spawning a task for each connection.
    pub async fn run(self) {
        loop {
            match self.socket.accept().await {
                Ok((stream, _)) => {
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, &ctx).await {
                            match e {
                                ConnectionError::Protocol(
                                    protocol::ProtocolError::ConnectionClosed,
                                ) => debug!("Client disconnected"),
                                ConnectionError::Protocol(protocol::ProtocolError::Timeout) => {
                                    warn!("Connection timeout")
                                }
                                _ => error!("Connection error: {}", e),
                            }
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

/// Handle a single client connection.
pub(crate) async fn handle_connection<P: ProcessAdapter, C: Clock>(
    stream: UnixStream,
    ctx: &ListenCtx<P, C>,
) -> Result<(), ConnectionError> {
    let (mut reader, mut writer) = stream.into_split();

    let request = protocol::read_request(&mut reader, DEFAULT_TIMEOUT).await?;

    // Polling requests at debug level, everything else at info
    if matches!(
        request,
        Request::Ping | Request::Status | Request::IsRunning { .. } | Request::Describe { .. }
    ) {
        debug!(request = ?request, "received request");
    } else {
        info!(request = ?request, "received request");
    }

    let response = handle_request(request, ctx).await;

    debug!("Sending response: {:?}", response);

    protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT).await?;

    Ok(())
}

/// Handle a single request and return a response.
pub(crate) async fn handle_request<P: ProcessAdapter, C: Clock>(
    request: Request,
    ctx: &ListenCtx<P, C>,
) -> Response {
    let supervisor: &Supervisor<P, C> = &ctx.supervisor;
    match request {
        Request::Ping => Response::Pong,

        Request::Hello { version: _ } => Response::Hello {
            version: PROTOCOL_VERSION.to_string(),
        },

        Request::Start {
            tenant_id,
            bot_token,
            model_key,
            collection,
            endpoint,
        } => {
            let launch = LaunchInputs {
                bot_token,
                model_key,
                collection,
                endpoint,
            };
            let request = match resolve_launch(ctx.store.as_ref(), &tenant_id, launch).await {
                Ok(request) => request,
                Err(response) => return response,
            };
            started(supervisor, &tenant_id, supervisor.try_start(&tenant_id, &request).await)
        }

        Request::Restart {
            tenant_id,
            bot_token,
            model_key,
            collection,
            endpoint,
        } => {
            let launch = LaunchInputs {
                bot_token,
                model_key,
                collection,
                endpoint,
            };
            let request = match resolve_launch(ctx.store.as_ref(), &tenant_id, launch).await {
                Ok(request) => request,
                Err(response) => return response,
            };
            started(
                supervisor,
                &tenant_id,
                supervisor.try_restart(&tenant_id, &request).await,
            )
        }

        Request::Stop { tenant_id } => Response::Stopped {
            stopped: supervisor.stop(&tenant_id).await,
        },

        Request::IsRunning { tenant_id } => Response::Running {
            running: supervisor.is_running(&tenant_id),
        },

        Request::Describe { tenant_id } => Response::Report {
            report: supervisor.describe(&tenant_id),
        },

        Request::List => Response::Reports {
            reports: supervisor.list(),
        },

        Request::RespawnAll => match respawn_tenants(supervisor, ctx.store.as_ref()).await {
            Ok((running, total)) => Response::Respawned { running, total },
            Err(e) => Response::Error {
                message: e.to_string(),
            },
        },

        Request::Status => Response::Status {
            uptime_secs: ctx.start_time.elapsed().as_secs(),
            workers_running: supervisor.running_count(),
            workers_registered: supervisor.registered_count(),
        },

        Request::Shutdown => {
            ctx.shutdown.notify_one();
            Response::ShuttingDown
        }
    }
}

/// Launch fields as supplied by the caller.
struct LaunchInputs {
    bot_token: Option<Secret>,
    model_key: Option<Secret>,
    collection: Option<String>,
    endpoint: Option<String>,
}

/// Fill in missing launch fields from the tenant store.
///
/// The store is only consulted when a credential is missing.
async fn resolve_launch(
    store: &dyn TenantStore,
    tenant_id: &TenantId,
    inputs: LaunchInputs,
) -> Result<LaunchRequest, Response> {
    let LaunchInputs {
        bot_token,
        model_key,
        collection,
        endpoint,
    } = inputs;

    let (bot_token, model_key, stored_collection) = match (bot_token, model_key) {
        (Some(bot_token), Some(model_key)) => (bot_token, model_key, None),
        (bot_token, model_key) => {
            let record = match store.get(tenant_id).await {
                Ok(Some(record)) => record,
                Ok(None) => {
                    return Err(Response::UnknownTenant {
                        tenant_id: tenant_id.clone(),
                    })
                }
                Err(e) => {
                    return Err(Response::Error {
                        message: e.to_string(),
                    })
                }
            };
            let stored_collection = record.collection_name();
            (
                bot_token.unwrap_or(record.bot_token),
                model_key.unwrap_or(record.model_key),
                Some(stored_collection),
            )
        }
    };

    let collection = collection
        .filter(|c| !c.trim().is_empty())
        .or(stored_collection)
        .unwrap_or_else(|| tenant_id.default_collection());

    let mut request = LaunchRequest::new(bot_token, model_key, collection);
    request.endpoint = endpoint;
    Ok(request)
}

fn started<P: ProcessAdapter, C: Clock, T>(
    supervisor: &Supervisor<P, C>,
    tenant_id: &TenantId,
    result: Result<T, SpawnError>,
) -> Response {
    match result {
        Ok(_) => Response::Started {
            report: supervisor.describe(tenant_id),
        },
        Err(e) => Response::StartFailed {
            message: e.to_string(),
            diagnostics: e.diagnostics().map(str::to_string),
        },
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
