use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;

use roamline_api::services::ai::model_client::OpenRouterClient;
use roamline_api::services::geocoding_service::GeoapifyClient;
use roamline_api::{db, middleware, routes};

const HOST: &str = "0.0.0.0";
const PORT: u16 = 8080;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    println!("Application starting...");

    env_logger::init_from_env(Env::default().default_filter_or("info"));
    println!("Logger initialized");

    if cfg!(debug_assertions) {
        dotenv::dotenv().ok();
    } else {
        println!("Release mode");
    }

    let host = std::env::var("HOST").unwrap_or_else(|_| HOST.to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| PORT.to_string())
        .parse()
        .unwrap_or(PORT);
    println!("Attempting to bind to {}:{}", host, port);

    let mongo_uri = std::env::var("MONGODB_URI").expect("MONGODB_URI must be set");
    println!("Got MongoDB URI, attempting connection...");
    let client = db::mongo::create_mongo_client(&mongo_uri).await;
    println!("MongoDB connection established");

    let model_client = OpenRouterClient::new().expect("OPENROUTER_API_KEY must be set");
    let geocode_client = GeoapifyClient::new().expect("GEOAPIFY_API_KEY must be set");

    println!("Starting HTTP server...");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(actix_cors::Cors::permissive())
            .route("/health", web::get().to(routes::health::health_check))
            .app_data(web::Data::new(client.clone()))
            .app_data(web::Data::new(model_client.clone()))
            .app_data(web::Data::new(geocode_client.clone()))
            .service(
                web::scope("/api")
                    // Public routes
                    .service(
                        web::scope("/auth")
                            .route("/signup", web::post().to(routes::account::auth::signup))
                            .route("/signin", web::post().to(routes::account::auth::signin))
                            .service(
                                web::scope("").wrap(middleware::auth::AuthMiddleware).route(
                                    "/session",
                                    web::get().to(routes::account::auth::user_session),
                                ),
                            ),
                    )
                    // Protected routes
                    .service(
                        web::scope("")
                            .wrap(middleware::auth::AuthMiddleware)
                            .service(
                                web::scope("/verifications")
                                    .route(
                                        "",
                                        web::post().to(
                                            routes::account::phone_verification::start_verification,
                                        ),
                                    )
                                    .route(
                                        "/check",
                                        web::post().to(
                                            routes::account::phone_verification::check_verification,
                                        ),
                                    ),
                            )
                            .service(
                                web::scope("/trips")
                                    .route("", web::post().to(routes::trip::create_trip))
                                    .route("", web::get().to(routes::trip::get_trips))
                                    .route("/{id}", web::get().to(routes::trip::get_trip_by_id))
                                    .route("/{id}", web::delete().to(routes::trip::delete_trip))
                                    .route(
                                        "/{id}/diary",
                                        web::get().to(routes::trip::get_trip_diary),
                                    )
                                    .route(
                                        "/{id}/companions",
                                        web::post().to(routes::trip::add_companion),
                                    )
                                    .route(
                                        "/{id}/companions",
                                        web::get().to(routes::trip::get_companions),
                                    )
                                    .route(
                                        "/{id}/itinerary",
                                        web::post().to(routes::ai::save_itinerary),
                                    ),
                            )
                            .service(
                                web::scope("/ai")
                                    .route(
                                        "/activity-suggestions",
                                        web::post().to(
                                            routes::ai::activity_suggestions::<OpenRouterClient>,
                                        ),
                                    )
                                    .route(
                                        "/destination-suggestions",
                                        web::post().to(routes::ai::destination_suggestions::<
                                            OpenRouterClient,
                                            GeoapifyClient,
                                        >),
                                    )
                                    .route(
                                        "/itinerary",
                                        web::post().to(
                                            routes::ai::generate_itinerary::<OpenRouterClient>,
                                        ),
                                    )
                                    .route(
                                        "/assistant",
                                        web::post().to(routes::ai::assistant::<OpenRouterClient>),
                                    ),
                            ),
                    ),
            )
    })
    .bind((host, port))?
    .run()
    .await
}
