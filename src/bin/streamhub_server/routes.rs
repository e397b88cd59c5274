//! HTTP route registration for the streamhub server.

use super::*;

pub(super) fn api_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let public = Router::new()
        .route("/users/register", post(register))
        .route("/users/login", post(login))
        .route("/users/refresh-token", post(refresh_token));

    let authed = Router::new()
        .route("/users/logout", post(logout))
        .route("/users/change-password", post(change_password))
        .route("/users/current-user", get(current_user))
        .route("/users/update-account", patch(update_account))
        .route("/users/avatar", patch(update_avatar))
        .route("/users/cover-image", patch(update_cover_image))
        .route("/users/c/:handle", get(channel_profile))
        .route("/users/watch-history", get(watch_history))
        .route("/subscriptions/c/:handle", post(toggle_subscription))
        .layer(middleware::from_fn_with_state(state, require_session));

    public.merge(authed)
}
