use super::*;

pub(crate) async fn channel_profile(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<IdentityView>,
    Path(handle): Path<String>,
) -> Result<Json<serde_json::Value>, Response> {
    let channel = state
        .queries
        .channel_profile(&viewer.id, &handle)
        .await
        .map_err(failure)?;
    Ok(Json(serde_json::json!({
        "message": "channel profile",
        "channel": channel,
    })))
}

pub(crate) async fn watch_history(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<IdentityView>,
) -> Result<Json<serde_json::Value>, Response> {
    let history = state
        .queries
        .watch_history(&viewer.id)
        .await
        .map_err(failure)?;
    Ok(Json(serde_json::json!({
        "message": "watch history",
        "history": history,
    })))
}

/// Subscribe/unsubscribe toggle for the authenticated viewer against the
/// channel named in the path.
pub(crate) async fn toggle_subscription(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<IdentityView>,
    Path(handle): Path<String>,
) -> Result<Json<serde_json::Value>, Response> {
    let channel = state.store.find_by_handle(&handle).await.ok_or_else(|| {
        failure(AccountError::NotFound(format!(
            "no channel named '{}'",
            handle.trim().to_lowercase()
        )))
    })?;

    let subscribed = if state.store.is_subscribed(&viewer.id, &channel.id).await {
        state
            .store
            .unsubscribe(&viewer.id, &channel.id)
            .await
            .map_err(failure)?;
        false
    } else {
        state
            .store
            .subscribe(&viewer.id, &channel.id)
            .await
            .map_err(failure)?;
        true
    };

    Ok(Json(serde_json::json!({
        "message": if subscribed { "subscribed" } else { "unsubscribed" },
        "subscribed": subscribed,
    })))
}
