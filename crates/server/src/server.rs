//! The HTTP server: router assembly, middleware stack and graceful shutdown.

use std::{future::Future, net::SocketAddr, sync::Arc};

use axum::{
    body::Body,
    http::Request,
    middleware::{from_fn, from_fn_with_state},
    Router,
};
use opentelemetry::global;
use opentelemetry_http::HeaderExtractor;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tokio::{net::TcpListener, sync::oneshot};
use tower_http::trace::TraceLayer;
use tracing::{info, Span};
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::{
    acl::Acl,
    config::ServerConfig,
    error::{ServerError, ServerResult},
    handlers::health_routes,
    logging::{self, debug_enabled},
    middleware::{
        acl_middleware, body_dump_middleware, catch_panic_layer, install_panic_hook,
        request_id_middleware, request_log_middleware, BodyDump, RequestId, Secure,
    },
    telemetry,
};

pub struct Server {
    config: ServerConfig,
    acl: Arc<Acl>,
    secure: Secure,
    tracer_provider: Option<SdkTracerProvider>,
}

impl Server {
    /// Install tracing, logging and the panic hook, then build the server.
    pub async fn new(config: ServerConfig, env_files: &[String]) -> ServerResult<Self> {
        let provider = telemetry::provide(&config.tracing, &config.name)?;
        let tracer = provider
            .as_ref()
            .map(|provider| telemetry::tracer(provider, &config.name));
        logging::provide(&config.logging, tracer)?;

        if provider.is_none() {
            info!("Tracing disabled");
        }
        if !env_files.is_empty() {
            info!(
                server_name = %config.name,
                env_files = %env_files.join(","),
                "Env files will be used for this server"
            );
        }
        install_panic_hook(config.recover.clone());

        let mut server = Self::build(config).await?;
        server.tracer_provider = provider;
        Ok(server)
    }

    /// Build the server without touching process globals.
    pub async fn build(config: ServerConfig) -> ServerResult<Self> {
        let acl = Arc::new(Acl::new(config.acl.clone()).await?);
        let secure = Secure::new(&config.secure)?;

        Ok(Self {
            config,
            acl,
            secure,
            tracer_provider: None,
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The enforcer shared with the ACL middleware.
    pub fn acl(&self) -> Arc<Acl> {
        self.acl.clone()
    }

    /// Add `GET /health` and the middleware stack to `app`.
    ///
    /// Requests pass recover, request id, request log, body dump, tracing
    /// span, secure and ACL in that order.
    pub fn router(&self, app: Router) -> Router {
        let mut router = app.merge(health_routes());

        if self.acl.enabled() {
            router = router.layer(from_fn_with_state(self.acl.clone(), acl_middleware));
        } else {
            info!("Authentication is disabled");
        }

        router = self
            .secure
            .apply(router)
            .layer(TraceLayer::new_for_http().make_span_with(make_span));

        if debug_enabled() {
            let dump = BodyDump::new(self.config.logging.skip_body_dump_urls.clone());
            router = router.layer(from_fn_with_state(dump, body_dump_middleware));
        } else {
            info!("Body dump is disabled");
        }

        router
            .layer(from_fn(request_log_middleware))
            .layer(from_fn(request_id_middleware))
            .layer(catch_panic_layer())
    }

    /// Serve on `HOST:PORT` until SIGINT or SIGTERM.
    pub async fn serve(self, router: Router) -> ServerResult<()> {
        self.serve_with_shutdown(router, shutdown_signal()).await
    }

    pub async fn serve_with_shutdown<F>(self, router: Router, signal: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.address()).await?;
        self.serve_listener(listener, router, signal).await
    }

    /// Serve on an already bound listener until `signal` resolves.
    pub async fn serve_listener<F>(
        self,
        listener: TcpListener,
        router: Router,
        signal: F,
    ) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if !self.config.production {
            info!(server_name = %self.config.name, address = %listener.local_addr()?, "Server started");
        }

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let server = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            let _ = stop_rx.await;
        });
        let mut handle = tokio::spawn(async move { server.await });

        let result = tokio::select! {
            finished = &mut handle => join_result(finished),
            _ = signal => {
                info!(server_name = %self.config.name, "Shutting down server");
                let _ = stop_tx.send(());
                match tokio::time::timeout(self.config.graceful_shutdown_timeout, &mut handle).await {
                    Ok(finished) => join_result(finished),
                    Err(_) => {
                        handle.abort();
                        tracing::error!(
                            server_name = %self.config.name,
                            "failed to gracefully shutdown the server"
                        );
                        Err(ServerError::ShutdownTimeout(self.config.graceful_shutdown_timeout))
                    }
                }
            }
        };

        if let Some(provider) = self.tracer_provider {
            telemetry::shutdown(provider);
        }
        result
    }
}

fn join_result(
    finished: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> ServerResult<()> {
    match finished {
        Ok(served) => served.map_err(|e| {
            tracing::error!(error = %e, "error while starting the server, terminating");
            ServerError::Io(e)
        }),
        Err(e) => Err(ServerError::Io(std::io::Error::other(e))),
    }
}

fn make_span(request: &Request<Body>) -> Span {
    let id = request
        .extensions()
        .get::<RequestId>()
        .map(RequestId::as_str)
        .unwrap_or_default();

    let span = tracing::info_span!(
        "request",
        id = %id,
        method = %request.method(),
        uri = %request.uri(),
    );

    let parent = global::get_text_map_propagator(|propagator| {
        propagator.extract(&HeaderExtractor(request.headers()))
    });
    span.set_parent(parent);
    span
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
