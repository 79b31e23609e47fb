#[cfg(feature = "ssr")]
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    use actix_files::Files;
    use actix_web::*;
    use leptos::logging::log;
    use leptos::*;
    use leptos_actix::{generate_route_list, LeptosRoutes};
    use trustshop::app::*;
    use trustshop::config::AppConfig;
    use trustshop::db::Database;

    let config = AppConfig::from_env();

    // Initialize the database
    let db = Database::new(&config.db_path).map_err(std::io::Error::other)?;
    db.create_schema().await.map_err(std::io::Error::other)?;
    log!("[DB] Schema ready at {}", config.db_path);

    if config.seed_demo {
        match db.seed_demo_data().await {
            Ok(tokens) => {
                for (email, token) in tokens {
                    log!("[DB] Demo account {} -> token {}", email, token);
                }
            }
            // a second start against the same file hits the unique email constraint
            Err(err) => log!("[DB] Demo data not seeded: {}", err),
        }
    }

    let conf = get_configuration(None).await.map_err(std::io::Error::other)?;
    let addr = conf.leptos_options.site_addr;
    let routes = generate_route_list(App);
    log!("listening on http://{}", &addr);

    HttpServer::new(move || {
        let leptos_options = &conf.leptos_options;
        let site_root = &leptos_options.site_root;

        App::new()
            .app_data(web::Data::new(db.clone()))
            .service(web::scope("/api").configure(trustshop::api::configure))
            // Serve JS/WASM/CSS from `pkg`
            .service(Files::new("/pkg", format!("{site_root}/pkg")))
            .service(Files::new("/assets", site_root))
            .service(favicon)
            .leptos_routes(leptos_options.to_owned(), routes.to_owned(), App)
            .app_data(web::Data::new(leptos_options.to_owned()))
    })
    .bind(&addr)?
    .run()
    .await
}

#[cfg(feature = "ssr")]
#[actix_web::get("favicon.ico")]
async fn favicon(
    leptos_options: actix_web::web::Data<leptos::LeptosOptions>,
) -> actix_web::Result<actix_files::NamedFile> {
    let leptos_options = leptos_options.into_inner();
    let site_root = &leptos_options.site_root;
    Ok(actix_files::NamedFile::open(format!("{site_root}/favicon.ico"))?)
}

#[cfg(not(any(feature = "ssr", feature = "csr")))]
pub fn main() {
    // no client-side main function
    // see lib.rs for the hydration entry point
}

#[cfg(all(not(feature = "ssr"), feature = "csr"))]
pub fn main() {
    // to run: `trunk serve --open --features csr`
    use trustshop::app::*;

    console_error_panic_hook::set_once();
    trustshop::utils::panic_hook::init();
    leptos::mount_to_body(App);
}
