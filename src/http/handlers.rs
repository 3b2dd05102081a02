use crate::{
    http::models,
    session::{Reply, SessionHandle, UiEvent},
    Status,
};
use futures::stream;
use std::{convert::Infallible, sync::Arc};
use tracing::instrument;
use warp::{
    http::{header::CONTENT_DISPOSITION, StatusCode},
    hyper::body::Bytes,
};

use super::query_logs::*;

#[instrument(level = "trace", skip(session))]
pub async fn get_page(session: Arc<SessionHandle>) -> Result<Box<dyn warp::Reply>, Infallible> {
    Ok(dispatch(&session, UiEvent::Page, QueryEvent::new("GET", "/", "page")).await)
}

#[instrument(level = "trace", skip(session))]
pub async fn get_view(session: Arc<SessionHandle>) -> Result<impl warp::Reply, Infallible> {
    Ok(warp::reply::json(&session.view()))
}

/// Streams the current view, then every re-render, as `view` events.
#[instrument(level = "trace", skip(session))]
pub async fn get_events(session: Arc<SessionHandle>) -> Result<impl warp::Reply, Infallible> {
    let updates = stream::unfold((session.views(), true), |(mut views, first)| async move {
        if !first && views.changed().await.is_err() {
            return None;
        }
        let view = views.borrow_and_update().clone();
        let event = warp::sse::Event::default().event("view").json_data(&view);
        Some((event, (views, false)))
    });
    Ok(warp::sse::reply(warp::sse::keep_alive().stream(updates)))
}

#[instrument(level = "trace", skip(session))]
pub async fn post_search(
    search: models::Search,
    session: Arc<SessionHandle>,
) -> Result<Box<dyn warp::Reply>, Infallible> {
    Ok(dispatch(
        &session,
        UiEvent::Search(search.query),
        QueryEvent::new("POST", "/api/search", "search"),
    )
    .await)
}

#[instrument(level = "trace", skip(session))]
pub async fn post_filter(
    filter: models::Filter,
    session: Arc<SessionHandle>,
) -> Result<Box<dyn warp::Reply>, Infallible> {
    Ok(dispatch(
        &session,
        UiEvent::Filter {
            category: filter.category,
            status: filter.status,
        },
        QueryEvent::new("POST", "/api/filter", "filter"),
    )
    .await)
}

#[instrument(level = "trace", skip(session))]
pub async fn post_toggle(
    id: u64,
    session: Arc<SessionHandle>,
) -> Result<Box<dyn warp::Reply>, Infallible> {
    Ok(dispatch(
        &session,
        UiEvent::Toggle(id),
        QueryEvent::new("POST", "/api/toggle", "toggle"),
    )
    .await)
}

#[instrument(level = "trace", skip(session))]
pub async fn post_reset(
    reset: models::Reset,
    session: Arc<SessionHandle>,
) -> Result<Box<dyn warp::Reply>, Infallible> {
    Ok(dispatch(
        &session,
        UiEvent::Reset {
            confirmed: reset.confirmed,
        },
        QueryEvent::new("POST", "/api/reset", "reset"),
    )
    .await)
}

#[instrument(level = "trace", skip(body, session))]
pub async fn post_import(
    body: Bytes,
    session: Arc<SessionHandle>,
) -> Result<Box<dyn warp::Reply>, Infallible> {
    Ok(dispatch(
        &session,
        UiEvent::Import(body.to_vec()),
        QueryEvent::new("POST", "/api/import", "import"),
    )
    .await)
}

#[instrument(level = "trace", skip(session))]
pub async fn get_export(session: Arc<SessionHandle>) -> Result<Box<dyn warp::Reply>, Infallible> {
    Ok(dispatch(
        &session,
        UiEvent::Export,
        QueryEvent::new("GET", "/api/export", "export"),
    )
    .await)
}

#[instrument(level = "trace", skip(session))]
pub async fn post_key(
    chord: crate::session::KeyChord,
    session: Arc<SessionHandle>,
) -> Result<Box<dyn warp::Reply>, Infallible> {
    Ok(dispatch(
        &session,
        UiEvent::Key(chord),
        QueryEvent::new("POST", "/api/key", "key"),
    )
    .await)
}

async fn dispatch(
    session: &SessionHandle,
    event: UiEvent,
    query: QueryEvent,
) -> Box<dyn warp::Reply> {
    match session.send(event).await {
        Ok(Reply::Rejected(status)) | Err(status) => {
            query.log_error(&status);
            error_reply(status)
        }
        Ok(reply) => {
            query.log();
            into_response(reply)
        }
    }
}

fn into_response(reply: Reply) -> Box<dyn warp::Reply> {
    match reply {
        Reply::Page(html) => Box::new(warp::reply::html(html)),
        Reply::Scheduled => Box::new(StatusCode::ACCEPTED),
        Reply::Rendered(view) => Box::new(warp::reply::json(&view)),
        Reply::Toggled {
            id,
            caught,
            celebrate,
            stats,
        } => Box::new(warp::reply::json(&models::Toggled {
            id,
            caught,
            celebrate,
            stats,
        })),
        Reply::Reset { message } => Box::new(warp::reply::json(&models::Message { message })),
        Reply::Imported { count } => Box::new(warp::reply::json(&models::Imported { count })),
        Reply::Exported(file) => {
            let disposition = format!("attachment; filename=\"{}\"", file.file_name());
            Box::new(warp::reply::with_header(
                warp::reply::json(&file),
                CONTENT_DISPOSITION,
                disposition,
            ))
        }
        Reply::Shortcut { action, prompt } => {
            Box::new(warp::reply::json(&models::Shortcut { action, prompt }))
        }
        Reply::Ignored => Box::new(StatusCode::NO_CONTENT),
        Reply::Rejected(status) => error_reply(status),
    }
}

fn error_reply(status: Status) -> Box<dyn warp::Reply> {
    let code = match &status {
        Status::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        Status::NotFound(_) => StatusCode::NOT_FOUND,
        Status::Ok | Status::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    Box::new(warp::reply::with_status(
        warp::reply::json(&models::Error {
            error: status.to_string(),
        }),
        code,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::Catalog,
        documents::Pokemon,
        progress::{LocalBackend, LocalStorage, ProgressStore},
        session::{start, Session, TokioClock},
    };
    use tokio::sync::mpsc;
    use warp::Reply as _;

    async fn running_session(dir: &tempfile::TempDir) -> Arc<SessionHandle> {
        let storage = LocalStorage::open(dir.path().join("local_storage.json")).unwrap();
        let store = ProgressStore::new(Arc::new(LocalBackend::new(storage)), 1);
        let catalog = Catalog::new(vec![Pokemon {
            id: 25,
            number: 25,
            name: "Pikachu".to_owned(),
            name_en: "Pikachu".to_owned(),
            types: vec!["électrik".to_owned()],
            location: "Forêt de Jade".to_owned(),
        }]);
        let (_, notifications) = mpsc::unbounded_channel();
        let (handle, _) = start(Session::new(Ok(catalog), store, TokioClock), notifications);
        Arc::new(handle)
    }

    #[test]
    fn status_codes() {
        let resp = error_reply(Status::invalid_argument("bad file")).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = error_reply(Status::internal("boom")).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let resp = into_response(Reply::Scheduled).into_response();
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn export_is_an_attachment() {
        let dir = tempfile::tempdir().unwrap();
        let session = running_session(&dir).await;

        let resp = get_export(session).await.unwrap().into_response();

        assert_eq!(resp.status(), StatusCode::OK);
        let disposition = resp.headers()[CONTENT_DISPOSITION].to_str().unwrap();
        assert!(disposition.starts_with("attachment; filename=\"shiny-dex-"));
        assert!(disposition.ends_with(".json\""));
    }

    #[tokio::test]
    async fn rejected_import_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let session = running_session(&dir).await;

        let resp = post_import(Bytes::from_static(b"[1, 2]"), session)
            .await
            .unwrap()
            .into_response();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
