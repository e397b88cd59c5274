use super::*;

pub(crate) struct RegisterForm {
    pub(crate) full_name: String,
    pub(crate) email: String,
    pub(crate) password: String,
    pub(crate) handle: String,
    pub(crate) avatar: Option<PathBuf>,
    pub(crate) cover_image: Option<PathBuf>,
}

pub(super) async fn read_register_form(
    tmp_dir: &std::path::Path,
    mut multipart: Multipart,
) -> Result<RegisterForm, AccountError> {
    let mut form = RegisterForm {
        full_name: String::new(),
        email: String::new(),
        password: String::new(),
        handle: String::new(),
        avatar: None,
        cover_image: None,
    };

    while let Some(field) = next_field(&mut multipart).await? {
        let Some(name) = field.name().map(|n| n.to_string()) else {
            continue;
        };
        match name.as_str() {
            "full_name" => form.full_name = read_text(field).await?,
            "email" => form.email = read_text(field).await?,
            "password" => form.password = read_text(field).await?,
            "handle" => form.handle = read_text(field).await?,
            "avatar" => form.avatar = Some(spool_part(tmp_dir, &read_bytes(field).await?)?),
            "cover_image" => {
                form.cover_image = Some(spool_part(tmp_dir, &read_bytes(field).await?)?)
            }
            _ => {}
        }
    }
    Ok(form)
}

/// Pull the one expected file part out of a multipart body. `None` means
/// the field never appeared.
pub(super) async fn read_single_file(
    tmp_dir: &std::path::Path,
    field_name: &str,
    mut multipart: Multipart,
) -> Result<Option<PathBuf>, AccountError> {
    let mut spooled = None;
    while let Some(field) = next_field(&mut multipart).await? {
        if field.name() == Some(field_name) {
            spooled = Some(spool_part(tmp_dir, &read_bytes(field).await?)?);
        }
    }
    Ok(spooled)
}

/// Remove spooled parts that will never reach the media store. Used on
/// the rejection path, where no upload consumes them.
pub(super) fn discard_spooled(form: &RegisterForm) {
    for path in [&form.avatar, &form.cover_image].into_iter().flatten() {
        let _ = std::fs::remove_file(path);
    }
}

/// Spool an uploaded part to the tmp dir so the media collaborator can
/// consume it as a local file path.
fn spool_part(tmp_dir: &std::path::Path, bytes: &[u8]) -> Result<PathBuf, AccountError> {
    let name = streamhub::store::generate_id()?;
    let path = tmp_dir.join(name);
    std::fs::write(&path, bytes).with_context(|| format!("spool upload {}", path.display()))?;
    Ok(path)
}

async fn next_field(
    multipart: &mut Multipart,
) -> Result<Option<axum::extract::multipart::Field<'_>>, AccountError> {
    multipart
        .next_field()
        .await
        .map_err(|err| AccountError::Validation(format!("malformed multipart body: {err}")))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AccountError> {
    field
        .text()
        .await
        .map_err(|err| AccountError::Validation(format!("malformed multipart field: {err}")))
}

async fn read_bytes(field: axum::extract::multipart::Field<'_>) -> Result<Vec<u8>, AccountError> {
    field
        .bytes()
        .await
        .map(|b| b.to_vec())
        .map_err(|err| AccountError::Validation(format!("malformed multipart field: {err}")))
}
