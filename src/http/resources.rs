use crate::session::SessionHandle;
use std::{convert::Infallible, sync::Arc};
use warp::{self, Filter};

pub fn with_session(
    session: Arc<SessionHandle>,
) -> impl Filter<Extract = (Arc<SessionHandle>,), Error = Infallible> + Clone {
    warp::any().map(move || Arc::clone(&session))
}
