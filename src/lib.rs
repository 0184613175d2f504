pub mod application;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::address_service::AddressService;
use application::cart_service::CartService;
use application::catalog_service::CatalogService;
use application::order_service::OrderService;
use domain::ports::PaymentGateway;
use infrastructure::address_repo::DieselAddressRepository;
use infrastructure::cart_repo::DieselCartRepository;
use infrastructure::catalog_repo::DieselCatalogRepository;
use infrastructure::order_repo::DieselOrderRepository;

pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) {
    let mut conn = pool.get().expect("Failed to get DB connection for migrations");
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Failed to run database migrations");
}

pub type AppOrderService =
    OrderService<DieselCartRepository, DieselAddressRepository, DieselOrderRepository>;

/// Application services over their Diesel adapters, shared across workers.
pub struct Services {
    pub catalog: CatalogService<DieselCatalogRepository>,
    pub carts: CartService<DieselCartRepository>,
    pub addresses: AddressService<DieselAddressRepository>,
    pub orders: AppOrderService,
}

impl Services {
    pub fn new(pool: DbPool, gateway: Arc<dyn PaymentGateway>) -> Self {
        Services {
            catalog: CatalogService::new(DieselCatalogRepository::new(pool.clone())),
            carts: CartService::new(DieselCartRepository::new(pool.clone())),
            addresses: AddressService::new(DieselAddressRepository::new(pool.clone())),
            orders: OrderService::new(
                DieselCartRepository::new(pool.clone()),
                DieselAddressRepository::new(pool.clone()),
                DieselOrderRepository::new(pool),
                gateway,
            ),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::products::create_category,
        handlers::products::list_categories,
        handlers::products::create_product,
        handlers::products::list_products,
        handlers::products::get_product,
        handlers::products::related_products,
        handlers::carts::get_cart,
        handlers::carts::quote_totals,
        handlers::carts::add_line,
        handlers::carts::update_line,
        handlers::carts::remove_line,
        handlers::carts::clear_cart,
        handlers::addresses::list_addresses,
        handlers::addresses::create_address,
        handlers::addresses::update_address,
        handlers::addresses::delete_address,
        handlers::addresses::set_default_address,
        handlers::orders::place_order,
        handlers::orders::get_order,
        handlers::orders::list_orders,
    ),
    components(schemas(
        handlers::products::CreateCategoryRequest,
        handlers::products::CategoryResponse,
        handlers::products::CreateProductRequest,
        handlers::products::ProductResponse,
        handlers::products::ProductSummaryResponse,
        handlers::products::ListProductsResponse,
        handlers::carts::AddLineRequest,
        handlers::carts::UpdateLineRequest,
        handlers::carts::ComponentResponse,
        handlers::carts::TotalsResponse,
        handlers::carts::CartLineResponse,
        handlers::carts::CartResponse,
        handlers::addresses::CreateAddressRequest,
        handlers::addresses::UpdateAddressRequest,
        handlers::addresses::AddressResponse,
        handlers::orders::PlaceOrderRequest,
        handlers::orders::OrderLineResponse,
        handlers::orders::OrderResponse,
        handlers::orders::ListOrdersResponse,
    )),
    tags(
        (name = "catalog", description = "Products and categories"),
        (name = "carts", description = "Cart lines and totals"),
        (name = "addresses", description = "Delivery and billing addresses"),
        (name = "orders", description = "Checkout and order history"),
    )
)]
struct ApiDoc;

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    pool: DbPool,
    gateway: Arc<dyn PaymentGateway>,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let services = web::Data::new(Services::new(pool, gateway));
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(services.clone())
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
            .service(
                web::scope("/categories")
                    .route("", web::post().to(handlers::products::create_category))
                    .route("", web::get().to(handlers::products::list_categories)),
            )
            .service(
                web::scope("/products")
                    .route("", web::post().to(handlers::products::create_product))
                    .route("", web::get().to(handlers::products::list_products))
                    .route("/{id}", web::get().to(handlers::products::get_product))
                    .route(
                        "/{id}/related",
                        web::get().to(handlers::products::related_products),
                    ),
            )
            .service(
                web::scope("/users/{user_id}")
                    .service(
                        web::scope("/cart")
                            .route("", web::get().to(handlers::carts::get_cart))
                            .route("", web::delete().to(handlers::carts::clear_cart))
                            .route("/totals", web::get().to(handlers::carts::quote_totals))
                            .route("/lines", web::post().to(handlers::carts::add_line))
                            .route(
                                "/lines/{line_id}",
                                web::patch().to(handlers::carts::update_line),
                            )
                            .route(
                                "/lines/{line_id}",
                                web::delete().to(handlers::carts::remove_line),
                            ),
                    )
                    .service(
                        web::scope("/addresses")
                            .route("", web::get().to(handlers::addresses::list_addresses))
                            .route("", web::post().to(handlers::addresses::create_address))
                            .route(
                                "/{address_id}",
                                web::put().to(handlers::addresses::update_address),
                            )
                            .route(
                                "/{address_id}",
                                web::delete().to(handlers::addresses::delete_address),
                            )
                            .route(
                                "/{address_id}/default",
                                web::post().to(handlers::addresses::set_default_address),
                            ),
                    )
                    .route("/orders", web::post().to(handlers::orders::place_order))
                    .route("/orders", web::get().to(handlers::orders::list_orders)),
            )
            .service(
                web::scope("/orders")
                    .route("/{id}", web::get().to(handlers::orders::get_order)),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
