pub mod file;

use actix_web::web;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/AddFiles")
            .route(web::get().to(file::list_files)),
    )
    .service(
        web::resource("/AddFiles/Details/{id}")
            .route(web::get().to(file::file_details)),
    )
    .service(
        web::resource("/AddFiles/Edit/{id}")
            .route(web::post().to(file::edit_file)),
    )
    .service(
        web::resource("/AddFiles/Delete/{id}")
            .route(web::post().to(file::delete_file)),
    )
    .service(
        web::resource("/UploadFile")
            .route(web::post().to(file::upload_file)),
    )
    .service(
        web::resource("/Download/{id}")
            .route(web::get().to(file::download_file)),
    );
}
