use super::*;

pub(crate) const ACCESS_COOKIE: &str = "accessToken";
pub(crate) const REFRESH_COOKIE: &str = "refreshToken";

fn session_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(true)
        .path("/")
        .build()
}

pub(super) fn set_session_cookies(jar: CookieJar, access: &str, refresh: &str) -> CookieJar {
    jar.add(session_cookie(ACCESS_COOKIE, access.to_string()))
        .add(session_cookie(REFRESH_COOKIE, refresh.to_string()))
}

/// Removal cookies must match the path the originals were set with.
pub(super) fn clear_session_cookies(jar: CookieJar) -> CookieJar {
    let mut access = Cookie::from(ACCESS_COOKIE);
    access.set_path("/");
    let mut refresh = Cookie::from(REFRESH_COOKIE);
    refresh.set_path("/");
    jar.remove(access).remove(refresh)
}
