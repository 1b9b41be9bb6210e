use std::{collections::BTreeMap, convert::Infallible, net::SocketAddr, path::PathBuf};

use anyhow::{Context, Result};
use tracing::{error, info};
use warp::{Filter, Reply};

use crate::{api, database::Database};

const BANNER: &str = "String Analyzer API is running...";
const MAX_BODY_SIZE: u64 = 64 * 1024;

/// Certificate and key used to serve HTTPS.
pub(crate) struct Tls {
    pub(crate) cert: PathBuf,
    pub(crate) key: PathBuf,
}

pub(crate) fn routes(
    db: Database,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let with_db = warp::any().map(move || db.clone());

    let index = warp::path::end().and(warp::get()).map(|| BANNER);

    // Must come before `get`, which would otherwise take the last segment as
    // a string value.
    let natural_language = warp::path!("strings" / "filter-by-natural-language")
        .and(warp::get())
        .and(with_db.clone())
        .and(warp::query::<Vec<(String, String)>>())
        .and_then(api::filter_by_natural_language);

    let list = warp::path!("strings")
        .and(warp::get())
        .and(with_db.clone())
        .and(warp::query::<BTreeMap<String, String>>())
        .and_then(api::list_strings);

    let create = warp::path!("strings")
        .and(warp::post())
        .and(with_db.clone())
        .and(warp::body::content_length_limit(MAX_BODY_SIZE))
        .and(warp::body::bytes())
        .and_then(api::create_string);

    let get = warp::path!("strings" / String)
        .and(warp::get())
        .and(with_db.clone())
        .and_then(api::get_string);

    let delete = warp::path!("strings" / String)
        .and(warp::delete())
        .and(with_db)
        .and_then(api::delete_string);

    index
        .or(natural_language)
        .or(list)
        .or(create)
        .or(get)
        .or(delete)
        .recover(api::handle_rejection)
        .with(warp::trace::request())
}

/// Serves the API on `addr` until the process receives Ctrl-C.
pub(crate) async fn serve(db: Database, addr: SocketAddr, tls: Option<Tls>) -> Result<()> {
    let routes = routes(db);
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Problem while listening for shutdown signal. {e}");
        }
        info!("Shutting down");
    };

    if let Some(tls) = tls {
        let (addr, server) = warp::serve(routes)
            .tls()
            .cert_path(tls.cert)
            .key_path(tls.key)
            .bind_with_graceful_shutdown(addr, shutdown);
        info!("Listening on https://{addr}");
        server.await;
    } else {
        let (addr, server) = warp::serve(routes)
            .try_bind_with_graceful_shutdown(addr, shutdown)
            .with_context(|| format!("failed to bind to {addr}"))?;
        info!("Listening on http://{addr}");
        server.await;
    }
    Ok(())
}
