use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers::{file, folder, health, public};
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(health::health))
        .nest("/files", file_routes(config))
        .nest("/folders", folder_routes())
        .nest("/public", public_routes())
}

fn file_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let upload = OpenApiRouter::new()
        .routes(routes!(file::upload_files))
        .layer(file::upload_body_limit(&config.vault));

    OpenApiRouter::new()
        .routes(routes!(file::list_files))
        .routes(routes!(file::storage_stats))
        .routes(routes!(file::get_file, file::delete_file))
        .routes(routes!(file::download_file))
        .routes(routes!(
            file::get_file_share,
            file::share_file,
            file::revoke_file_share
        ))
        .merge(upload)
}

fn folder_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(folder::create_folder, folder::list_folders))
        .routes(routes!(folder::rename_folder, folder::delete_folder))
        .routes(routes!(folder::folder_tree))
        .routes(routes!(
            folder::get_folder_share,
            folder::share_folder,
            folder::revoke_folder_share
        ))
}

fn public_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(public::list_public_files))
        .routes(routes!(public::download_shared))
        .routes(routes!(public::download_public_file))
}
