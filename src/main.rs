use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::TokioIo;
use socket2::{Domain, Protocol, Socket, Type};
use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;

use edgeserve::bridge::{Bridge, PeerAddr, StaticOnly};
use edgeserve::config::Config;
use edgeserve::logger;
use edgeserve::middleware::{Chain, Handler};
use edgeserve::prerendered::{PrerenderedHandler, PrerenderedSet};
use edgeserve::static_files::{ContentRewriter, FileIndex, StaticServer};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Config::load()?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }

    let runtime = runtime_builder.build()?;
    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    logger::init(&cfg)?;

    let addr = cfg.get_socket_addr()?;
    let listener = create_reusable_listener(addr)?;

    let chain = Arc::new(build_chain(&cfg));

    logger::log_server_start(&addr, &cfg);

    let access_log = cfg.logging.access_log;
    let keep_alive = cfg.server.keep_alive_timeout > 0;
    let timeout_secs = std::cmp::max(cfg.server.read_timeout, cfg.server.write_timeout);

    loop {
        match listener.accept().await {
            Ok((stream, peer_addr)) => {
                let chain = Arc::clone(&chain);
                tokio::spawn(async move {
                    serve_connection(
                        stream,
                        peer_addr,
                        chain,
                        access_log,
                        keep_alive,
                        timeout_secs,
                    )
                    .await;
                });
            }
            Err(e) => {
                logger::log_error(&format!("Failed to accept connection: {e}"));
            }
        }
    }
}

/// Handle a single connection: HTTP/1.1 with optional keep-alive, the peer
/// address injected as a request extension, and an overall I/O timeout.
async fn serve_connection(
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    chain: Arc<Chain<Incoming>>,
    access_log: bool,
    keep_alive: bool,
    timeout_secs: u64,
) {
    let io = TokioIo::new(stream);

    let mut builder = http1::Builder::new();
    builder.keep_alive(keep_alive);

    let conn = builder.serve_connection(
        io,
        service_fn(move |mut req: Request<Incoming>| {
            let chain = Arc::clone(&chain);
            async move {
                if access_log {
                    logger::log_request(req.method(), req.uri());
                }
                req.extensions_mut().insert(PeerAddr(peer_addr));
                Ok::<_, Infallible>(chain.dispatch(req).await)
            }
        }),
    );

    if timeout_secs == 0 {
        if let Err(err) = conn.await {
            logger::log_connection_error(&err);
        }
        return;
    }

    let timeout = std::time::Duration::from_secs(timeout_secs);
    match tokio::time::timeout(timeout, conn).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => logger::log_connection_error(&err),
        Err(_) => {
            logger::log_warning(&format!(
                "Connection from {peer_addr} timed out after {timeout_secs} seconds"
            ));
        }
    }
}

/// Assemble the handler chain: hashed client assets, plain static assets,
/// prerendered pages, then the upstream bridge as the terminal handler.
fn build_chain(cfg: &Config) -> Chain<Incoming> {
    let mut handlers: Vec<Box<dyn Handler<Incoming>>> = Vec::new();

    let cache_control = cfg.cache_control();
    let static_rewriter = ContentRewriter::new(
        cfg.rewrite.static_types.clone(),
        &cfg.rewrite.find,
        &cfg.rewrite.replace,
    );

    let client_index = FileIndex::build(Path::new(&cfg.assets.client_dir), &cache_control);
    if !client_index.is_empty() {
        logger::log_index_built("client", client_index.len());
        let mut server = StaticServer::new(
            client_index,
            cfg.assets.extensions.clone(),
            &cfg.assets.fallback,
            static_rewriter.clone(),
        );
        if let Some(prefix) = cfg.assets.immutable_prefix.clone() {
            server = server.with_header_hook(Box::new(move |headers, path| {
                if path.starts_with(&prefix) {
                    headers.insert(
                        hyper::header::CACHE_CONTROL,
                        hyper::header::HeaderValue::from_static(
                            "public, max-age=31536000, immutable",
                        ),
                    );
                }
            }));
        }
        handlers.push(Box::new(server));
    }

    let static_index = FileIndex::build(Path::new(&cfg.assets.static_dir), &cache_control);
    if !static_index.is_empty() {
        logger::log_index_built("static", static_index.len());
        handlers.push(Box::new(StaticServer::new(
            static_index,
            cfg.assets.extensions.clone(),
            &cfg.assets.fallback,
            static_rewriter.clone(),
        )));
    }

    let prerendered_index =
        FileIndex::build(Path::new(&cfg.assets.prerendered_dir), &cache_control);
    if !prerendered_index.is_empty() {
        logger::log_index_built("prerendered", prerendered_index.len());
        let pages = load_prerendered_set(cfg.assets.prerendered_manifest.as_deref());
        let assets = StaticServer::new(
            prerendered_index,
            cfg.assets.extensions.clone(),
            &cfg.assets.fallback,
            static_rewriter,
        );
        handlers.push(Box::new(PrerenderedHandler::new(pages, assets)));
    }

    let stream_rewriter = ContentRewriter::new(
        cfg.rewrite.stream_types.clone(),
        &cfg.rewrite.find,
        &cfg.rewrite.replace,
    );
    handlers.push(Box::new(Bridge::new(
        Arc::new(StaticOnly),
        cfg.edge.clone(),
        stream_rewriter,
    )));

    Chain::new(handlers)
}

fn load_prerendered_set(manifest: Option<&str>) -> PrerenderedSet {
    let Some(path) = manifest else {
        return PrerenderedSet::empty();
    };
    match PrerenderedSet::load(&PathBuf::from(path)) {
        Ok(pages) => pages,
        Err(e) => {
            logger::log_warning(&format!(
                "Failed to load prerendered manifest '{path}': {e}"
            ));
            PrerenderedSet::empty()
        }
    }
}

/// Create a `TcpListener` with `SO_REUSEPORT` and `SO_REUSEADDR` enabled so a
/// replacement process can bind before the old one exits.
fn create_reusable_listener(addr: std::net::SocketAddr) -> std::io::Result<TcpListener> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_port(true)?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(128)?;

    let std_listener: std::net::TcpListener = socket.into();
    TcpListener::from_std(std_listener)
}
