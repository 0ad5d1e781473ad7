use std::sync::Arc;

use crate::config::ServerConfig;
use crate::router::Router;
use crate::upload::UploadStore;

/// Shared application state handed to every axum handler.
///
/// The chat core is owned by the [`Router`]; handlers only ever reach it
/// through that seam.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<Router>,
    pub uploads: Arc<UploadStore>,
    pub config: Arc<ServerConfig>,
}
