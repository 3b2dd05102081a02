use crate::session::{KeyChord, SessionHandle};
use std::sync::Arc;
use tracing::warn;
use warp::{self, Filter};

use super::{handlers, models, resources::*};

/// Returns a Filter with all available routes.
pub fn routes(
    session: Arc<SessionHandle>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    home(Arc::clone(&session))
        .or(get_view(Arc::clone(&session)))
        .or(get_events(Arc::clone(&session)))
        .or(post_search(Arc::clone(&session)))
        .or(post_filter(Arc::clone(&session)))
        .or(post_toggle(Arc::clone(&session)))
        .or(post_reset(Arc::clone(&session)))
        .or(post_import(Arc::clone(&session)))
        .or(get_export(Arc::clone(&session)))
        .or(post_key(session))
        .or_else(|e| async {
            warn! {"Rejected route: {:?}", e};
            Err(e)
        })
}

/// GET /
fn home(
    session: Arc<SessionHandle>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    warp::path!()
        .and(warp::get())
        .and(with_session(session))
        .and_then(handlers::get_page)
}

/// GET /api/view
fn get_view(
    session: Arc<SessionHandle>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    warp::path!("api" / "view")
        .and(warp::get())
        .and(with_session(session))
        .and_then(handlers::get_view)
}

/// GET /api/events
fn get_events(
    session: Arc<SessionHandle>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    warp::path!("api" / "events")
        .and(warp::get())
        .and(with_session(session))
        .and_then(handlers::get_events)
}

/// POST /api/search
fn post_search(
    session: Arc<SessionHandle>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    warp::path!("api" / "search")
        .and(warp::post())
        .and(json_body::<models::Search>())
        .and(with_session(session))
        .and_then(handlers::post_search)
}

/// POST /api/filter
fn post_filter(
    session: Arc<SessionHandle>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    warp::path!("api" / "filter")
        .and(warp::post())
        .and(json_body::<models::Filter>())
        .and(with_session(session))
        .and_then(handlers::post_filter)
}

/// POST /api/toggle/{id}
fn post_toggle(
    session: Arc<SessionHandle>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    warp::path!("api" / "toggle" / u64)
        .and(warp::post())
        .and(with_session(session))
        .and_then(handlers::post_toggle)
}

/// POST /api/reset
fn post_reset(
    session: Arc<SessionHandle>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    warp::path!("api" / "reset")
        .and(warp::post())
        .and(json_body::<models::Reset>())
        .and(with_session(session))
        .and_then(handlers::post_reset)
}

/// POST /api/import
fn post_import(
    session: Arc<SessionHandle>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    warp::path!("api" / "import")
        .and(warp::post())
        .and(warp::body::content_length_limit(1024 * 1024))
        .and(warp::body::bytes())
        .and(with_session(session))
        .and_then(handlers::post_import)
}

/// GET /api/export
fn get_export(
    session: Arc<SessionHandle>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    warp::path!("api" / "export")
        .and(warp::get())
        .and(with_session(session))
        .and_then(handlers::get_export)
}

/// POST /api/key
fn post_key(
    session: Arc<SessionHandle>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    warp::path!("api" / "key")
        .and(warp::post())
        .and(json_body::<KeyChord>())
        .and(with_session(session))
        .and_then(handlers::post_key)
}

fn json_body<T: serde::de::DeserializeOwned + Send>(
) -> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone {
    warp::body::content_length_limit(16 * 1024).and(warp::body::json())
}
